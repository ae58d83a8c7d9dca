//! Completion provider — answers a question, never fails.
//!
//! Two variants, fixed at startup:
//! - [`Mode::Llm`] sends the question to an upstream [`Provider`] with a
//!   fixed system instruction. Any upstream failure degrades to the echo
//!   answer for that request; the failure is logged, never returned.
//! - [`Mode::Echo`] answers locally with [`echo_answer`].

use askrelay_config::LlmConfig;
use askrelay_core::message::Message;
use askrelay_core::provider::{Provider, ProviderRequest};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::echo::{EchoProvider, echo_answer};

/// Which variant answers chat requests for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Llm,
    Echo,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Llm => "llm",
            Mode::Echo => "echo",
        }
    }
}

/// Token accounting attached to a single chat response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UsageRecord {
    pub tokens_in: u32,
    pub tokens_out: u32,
}

/// The answer to one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub answer: String,
    pub usage: Option<UsageRecord>,
}

/// Request parameters sent with every upstream call.
#[derive(Debug, Clone)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
}

impl From<&LlmConfig> for CompletionSettings {
    fn from(config: &LlmConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            system_prompt: config.system_prompt.clone(),
        }
    }
}

impl Default for CompletionSettings {
    fn default() -> Self {
        (&LlmConfig::default()).into()
    }
}

pub struct CompletionProvider {
    mode: Mode,
    provider: Arc<dyn Provider>,
    settings: CompletionSettings,
}

impl CompletionProvider {
    /// The local echo variant.
    pub fn echo() -> Self {
        Self {
            mode: Mode::Echo,
            provider: Arc::new(EchoProvider),
            settings: CompletionSettings::default(),
        }
    }

    /// The LLM-backed variant over an upstream provider.
    pub fn llm(provider: Arc<dyn Provider>, settings: CompletionSettings) -> Self {
        Self {
            mode: Mode::Llm,
            provider,
            settings,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    pub async fn health_check(&self) -> bool {
        matches!(self.provider.health_check().await, Ok(true))
    }

    /// Answer a question. Upstream failures fall back to the echo answer.
    pub async fn complete(&self, question: &str) -> Completion {
        let request = ProviderRequest {
            model: self.settings.model.clone(),
            messages: vec![
                Message::system(&self.settings.system_prompt),
                Message::user(question),
            ],
            temperature: self.settings.temperature,
            max_tokens: Some(self.settings.max_tokens),
        };

        let start = Instant::now();
        let response = match self.provider.complete(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(provider = %self.provider.name(), error = %e, "Completion failed, answering with echo");
                return Completion {
                    answer: echo_answer(question),
                    usage: None,
                };
            }
        };

        let usage = response.usage.map(|u| UsageRecord {
            tokens_in: u.prompt_tokens,
            tokens_out: u.completion_tokens,
        });

        if self.mode == Mode::Llm {
            info!(
                route = "OPENAI chat",
                ms = start.elapsed().as_millis() as u64,
                tokens_in = usage.map(|u| u.tokens_in),
                tokens_out = usage.map(|u| u.tokens_out),
                "Upstream completion"
            );
        }

        let trimmed = response.message.content.trim();
        let answer = if trimmed.is_empty() {
            echo_answer(question)
        } else {
            trimmed.to_string()
        };

        Completion { answer, usage }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use askrelay_core::error::ProviderError;
    use askrelay_core::provider::{ProviderResponse, Usage};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Returns a fixed reply and records every request it sees.
    struct ScriptedProvider {
        reply: Result<ProviderResponse, ProviderError>,
        seen: Mutex<Vec<ProviderRequest>>,
    }

    impl ScriptedProvider {
        fn answering(text: &str, usage: Option<Usage>) -> Self {
            Self {
                reply: Ok(ProviderResponse {
                    message: Message::assistant(text),
                    usage,
                    model: "mock".into(),
                }),
                seen: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: ProviderError) -> Self {
            Self {
                reply: Err(error),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.reply.clone()
        }
    }

    fn usage(prompt: u32, completion: u32) -> Usage {
        Usage {
            prompt_tokens: prompt,
            completion_tokens: completion,
            total_tokens: prompt + completion,
        }
    }

    #[tokio::test]
    async fn echo_mode_answers_locally() {
        let completer = CompletionProvider::echo();
        let completion = completer.complete("hi").await;

        assert_eq!(completer.mode(), Mode::Echo);
        assert_eq!(completion.answer, "Hello! You asked: \"hi\"");
        assert!(completion.usage.is_none());
    }

    #[tokio::test]
    async fn llm_mode_trims_answer_and_maps_usage() {
        let upstream = Arc::new(ScriptedProvider::answering("  Paris.\n", Some(usage(21, 2))));
        let completer = CompletionProvider::llm(upstream.clone(), CompletionSettings::default());

        let completion = completer.complete("Capital of France?").await;
        assert_eq!(completion.answer, "Paris.");
        assert_eq!(
            completion.usage,
            Some(UsageRecord {
                tokens_in: 21,
                tokens_out: 2
            })
        );
        assert_eq!(completer.mode(), Mode::Llm);
    }

    #[tokio::test]
    async fn llm_request_carries_fixed_parameters() {
        let upstream = Arc::new(ScriptedProvider::answering("ok", None));
        let completer = CompletionProvider::llm(upstream.clone(), CompletionSettings::default());
        completer.complete("question?").await;

        let seen = upstream.seen.lock().unwrap();
        let request = &seen[0];
        assert_eq!(request.model, "gpt-4o-mini");
        assert_eq!(request.max_tokens, Some(200));
        assert!((request.temperature - 0.7).abs() < f32::EPSILON);
        assert_eq!(request.messages.len(), 2);
        assert_eq!(
            request.messages[0].content,
            "You are a concise assistant. Keep answers short and helpful."
        );
        assert_eq!(request.messages[1].content, "question?");
    }

    #[tokio::test]
    async fn empty_upstream_answer_falls_back_but_keeps_usage() {
        let upstream = Arc::new(ScriptedProvider::answering("   ", Some(usage(9, 0))));
        let completer = CompletionProvider::llm(upstream, CompletionSettings::default());

        let completion = completer.complete("anything").await;
        assert_eq!(completion.answer, "Hello! You asked: \"anything\"");
        assert_eq!(
            completion.usage,
            Some(UsageRecord {
                tokens_in: 9,
                tokens_out: 0
            })
        );
    }

    #[tokio::test]
    async fn upstream_failure_degrades_to_echo() {
        let upstream = Arc::new(ScriptedProvider::failing(ProviderError::Network(
            "connection refused".into(),
        )));
        let completer = CompletionProvider::llm(upstream, CompletionSettings::default());

        let completion = completer.complete("hi").await;
        assert_eq!(completion.answer, "Hello! You asked: \"hi\"");
        assert!(completion.usage.is_none());
        // Mode is a startup decision; a failed call does not change it.
        assert_eq!(completer.mode(), Mode::Llm);
    }

    #[test]
    fn mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Mode::Llm).unwrap(), "\"llm\"");
        assert_eq!(Mode::Echo.as_str(), "echo");
    }

    #[test]
    fn usage_record_field_names() {
        let json = serde_json::to_value(UsageRecord {
            tokens_in: 3,
            tokens_out: 4,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"tokens_in": 3, "tokens_out": 4}));
    }

    /// Collects JSON log output written by a thread-local subscriber.
    #[derive(Clone, Default)]
    struct LogCapture(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for LogCapture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl LogCapture {
        fn install() -> (Self, tracing::subscriber::DefaultGuard) {
            let capture = Self::default();
            let writer = capture.clone();
            let subscriber = tracing_subscriber::fmt()
                .json()
                .with_max_level(tracing::Level::INFO)
                .with_writer(move || writer.clone())
                .finish();
            (capture, tracing::subscriber::set_default(subscriber))
        }

        fn upstream_lines(&self) -> Vec<serde_json::Value> {
            let raw = String::from_utf8(self.0.lock().unwrap().clone()).unwrap();
            raw.lines()
                .filter_map(|l| serde_json::from_str::<serde_json::Value>(l).ok())
                .map(|v| v["fields"].clone())
                .filter(|f| f["route"] == "OPENAI chat")
                .collect()
        }
    }

    #[tokio::test]
    async fn llm_call_logs_upstream_line_with_tokens() {
        let (logs, _guard) = LogCapture::install();
        let upstream = Arc::new(ScriptedProvider::answering("Paris.", Some(usage(21, 2))));
        let completer = CompletionProvider::llm(upstream, CompletionSettings::default());

        completer.complete("Capital of France?").await;

        let lines = logs.upstream_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["tokens_in"], 21);
        assert_eq!(lines[0]["tokens_out"], 2);
        assert!(lines[0]["ms"].is_u64());
    }

    #[tokio::test]
    async fn echo_mode_logs_no_upstream_line() {
        let (logs, _guard) = LogCapture::install();

        CompletionProvider::echo().complete("hi").await;

        assert!(logs.upstream_lines().is_empty());
    }
}
