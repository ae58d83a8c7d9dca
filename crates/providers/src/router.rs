//! Provider selection — picks the completion variant from config at startup.

use askrelay_config::AppConfig;
use askrelay_core::error::ProviderError;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::completion::{CompletionProvider, CompletionSettings};
use crate::openai_compat::OpenAiCompatProvider;

/// Build the completion provider for this process.
///
/// The LLM-backed variant is chosen iff an API key is configured; the
/// choice never changes afterwards.
pub fn build_from_config(config: &AppConfig) -> Result<CompletionProvider, ProviderError> {
    let Some(api_key) = config.llm.api_key.as_deref().filter(|k| !k.is_empty()) else {
        info!("No LLM API key configured, answering in echo mode");
        return Ok(CompletionProvider::echo());
    };

    let provider = OpenAiCompatProvider::new(
        provider_name(&config.llm.base_url),
        &config.llm.base_url,
        api_key,
        Duration::from_secs(config.llm.timeout_secs),
    )?;

    info!(
        provider = provider_name(&config.llm.base_url),
        base_url = %provider.base_url(),
        model = %config.llm.model,
        "LLM completion enabled"
    );

    Ok(CompletionProvider::llm(
        Arc::new(provider),
        CompletionSettings::from(&config.llm),
    ))
}

/// A display name for well-known endpoints.
fn provider_name(base_url: &str) -> &'static str {
    if base_url.contains("api.openai.com") {
        "openai"
    } else if base_url.contains("openrouter.ai") {
        "openrouter"
    } else if base_url.contains("localhost:11434") {
        "ollama"
    } else {
        "openai-compatible"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::Mode;

    #[test]
    fn no_key_selects_echo() {
        let provider = build_from_config(&AppConfig::default()).unwrap();
        assert_eq!(provider.mode(), Mode::Echo);
        assert_eq!(provider.provider_name(), "echo");
    }

    #[test]
    fn empty_key_selects_echo() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some(String::new());
        assert_eq!(build_from_config(&config).unwrap().mode(), Mode::Echo);
    }

    #[test]
    fn key_selects_llm() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-test".into());
        config.llm.model = "gpt-4o".into();

        let provider = build_from_config(&config).unwrap();
        assert_eq!(provider.mode(), Mode::Llm);
        assert_eq!(provider.provider_name(), "openai");
        assert_eq!(provider.settings().model, "gpt-4o");
    }

    #[test]
    fn well_known_names() {
        assert_eq!(provider_name("https://openrouter.ai/api/v1"), "openrouter");
        assert_eq!(provider_name("http://localhost:11434/v1"), "ollama");
        assert_eq!(provider_name("http://10.0.0.5:8000/v1"), "openai-compatible");
    }
}
