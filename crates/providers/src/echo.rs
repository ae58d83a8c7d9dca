//! Echo provider — deterministic local answers, no network.
//!
//! Used when no LLM credential is configured, and as the answer of last
//! resort when the upstream call fails.

use askrelay_core::error::ProviderError;
use askrelay_core::message::{Message, Role};
use askrelay_core::provider::*;
use async_trait::async_trait;

/// The echo text for a question: `Hello! You asked: "<question>"`.
pub fn echo_answer(question: &str) -> String {
    format!("Hello! You asked: \"{question}\"")
}

/// A provider that answers by quoting the last user message back.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoProvider;

#[async_trait]
impl askrelay_core::Provider for EchoProvider {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let question = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        Ok(ProviderResponse {
            message: Message::assistant(echo_answer(question)),
            usage: None,
            model: "echo".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn echo_text_is_exact() {
        assert_eq!(echo_answer("hi"), "Hello! You asked: \"hi\"");
        assert_eq!(echo_answer(""), "Hello! You asked: \"\"");
    }

    #[tokio::test]
    async fn echoes_last_user_message_without_usage() {
        let request = ProviderRequest {
            model: "ignored".into(),
            messages: vec![
                Message::system("You are a concise assistant."),
                Message::user("first"),
                Message::user("second"),
            ],
            temperature: 0.7,
            max_tokens: Some(200),
        };

        let response = EchoProvider.complete(request).await.unwrap();
        assert_eq!(response.message.content, "Hello! You asked: \"second\"");
        assert!(response.usage.is_none());
        assert_eq!(EchoProvider.name(), "echo");
    }
}
