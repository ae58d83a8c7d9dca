//! Error types for the AskRelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each external collaborator has its own error enum; the gateway maps
//! them onto HTTP responses.

use thiserror::Error;

/// Failures talking to an upstream chat-completion API.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures reading from the external audit store.
#[derive(Debug, Clone, Error)]
pub enum AuditError {
    #[error("Audit sink not configured")]
    NotConfigured,

    #[error("{0}")]
    QueryFailed(String),

    #[error("Audit sink connection failed: {0}")]
    Connection(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        };
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn audit_query_error_keeps_upstream_detail() {
        let err = AuditError::QueryFailed("relation \"messages\" does not exist".into());
        assert_eq!(err.to_string(), "relation \"messages\" does not exist");
    }
}
