//! Audit sink implementations for AskRelay.
//!
//! All sinks implement `askrelay_core::AuditSink` and are read-only.

pub mod supabase;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use supabase::SupabaseSink;

#[cfg(feature = "postgres")]
pub use postgres::PostgresSink;

use askrelay_config::AuditConfig;
use askrelay_core::audit::AuditSink;
use askrelay_core::error::AuditError;
use std::sync::Arc;
use tracing::info;

/// Build the configured audit sink, or `None` when the store is not wired.
pub fn build_from_config(config: &AuditConfig) -> Result<Option<Arc<dyn AuditSink>>, AuditError> {
    if !config.is_configured() {
        info!(backend = %config.backend, "Audit sink not configured");
        return Ok(None);
    }

    match config.backend.as_str() {
        "postgres" => build_postgres(config),
        _ => {
            let (Some(url), Some(key)) = (config.url.as_deref(), config.service_key.as_deref())
            else {
                return Ok(None);
            };
            info!(url = %url, table = %config.table, "Supabase audit sink configured");
            Ok(Some(Arc::new(SupabaseSink::new(url, key, &config.table)?)))
        }
    }
}

#[cfg(feature = "postgres")]
fn build_postgres(config: &AuditConfig) -> Result<Option<Arc<dyn AuditSink>>, AuditError> {
    let Some(url) = config.database_url.as_deref() else {
        return Ok(None);
    };
    Ok(Some(Arc::new(PostgresSink::connect_lazy(url, &config.table)?)))
}

#[cfg(not(feature = "postgres"))]
fn build_postgres(_config: &AuditConfig) -> Result<Option<Arc<dyn AuditSink>>, AuditError> {
    Err(AuditError::Connection(
        "audit.backend = \"postgres\" requires building with the `postgres` feature".into(),
    ))
}
