//! Configuration loading, validation, and management for AskRelay.
//!
//! Loads configuration from a TOML file (`--config`, `$ASKRELAY_CONFIG`, or
//! `./askrelay.toml`) and then applies environment variable overrides.
//! Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "askrelay.toml";

/// The root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Upstream LLM settings
    #[serde(default)]
    pub llm: LlmConfig,

    /// External audit store settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// HTTP server settings
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Log output settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// API key; its presence at startup selects the LLM-backed mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// OpenAI-compatible base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Upper bound on generated tokens per answer
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Upstream HTTP timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    200
}
fn default_system_prompt() -> String {
    "You are a concise assistant. Keep answers short and helpful.".into()
}
fn default_timeout_secs() -> u64 {
    600
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_prompt: default_system_prompt(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// "supabase" (PostgREST over HTTP) or "postgres" (direct connection)
    #[serde(default = "default_audit_backend")]
    pub backend: String,

    /// Supabase project URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Supabase service-role key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_key: Option<String>,

    /// Postgres connection string (postgres backend only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,

    #[serde(default = "default_audit_table")]
    pub table: String,
}

fn default_audit_backend() -> String {
    "supabase".into()
}
fn default_audit_table() -> String {
    "messages".into()
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            backend: default_audit_backend(),
            url: None,
            service_key: None,
            database_url: None,
            table: default_audit_table(),
        }
    }
}

impl std::fmt::Debug for AuditConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuditConfig")
            .field("backend", &self.backend)
            .field("url", &self.url)
            .field("service_key", &redact(&self.service_key))
            .field("database_url", &redact(&self.database_url))
            .field("table", &self.table)
            .finish()
    }
}

impl AuditConfig {
    /// Whether enough settings are present to reach the configured backend.
    pub fn is_configured(&self) -> bool {
        match self.backend.as_str() {
            "postgres" => self.database_url.is_some(),
            _ => self.url.is_some() && self.service_key.is_some(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory of static files served for unrouted paths
    #[serde(default = "default_public_dir")]
    pub public_dir: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_public_dir() -> PathBuf {
    PathBuf::from("public")
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_dir: default_public_dir(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// "json" or "text"
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".into()
}
fn default_log_format() -> String {
    "json".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration and apply environment overrides.
    ///
    /// Path resolution: explicit `path`, then `$ASKRELAY_CONFIG`, then
    /// `./askrelay.toml`. Recognised environment variables:
    /// - `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`
    /// - `SUPABASE_URL`, `SUPABASE_SERVICE_ROLE_KEY`, `DATABASE_URL`
    /// - `PORT`
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = Self::resolve_path(path);
        let mut config = Self::load_from(&path)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// The config file that [`AppConfig::load`] would read.
    pub fn resolve_path(path: Option<&Path>) -> PathBuf {
        path.map(Path::to_path_buf)
            .or_else(|| std::env::var_os("ASKRELAY_CONFIG").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }

    /// Load configuration from a specific file path, without env overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    ///
    /// Empty values are treated as unset.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = get("OPENAI_API_KEY") {
            self.llm.api_key = Some(key);
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.llm.base_url = url;
        }
        if let Some(url) = get("SUPABASE_URL") {
            self.audit.url = Some(url);
        }
        if let Some(key) = get("SUPABASE_SERVICE_ROLE_KEY") {
            self.audit.service_key = Some(key);
        }
        if let Some(url) = get("DATABASE_URL") {
            self.audit.database_url = Some(url);
        }
        if let Some(port) = get("PORT") {
            self.gateway.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!("PORT is not a valid port: {port}")))?;
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigError::ValidationError(
                "llm.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.llm.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "llm.max_tokens must be > 0".into(),
            ));
        }

        if !matches!(self.audit.backend.as_str(), "supabase" | "postgres") {
            return Err(ConfigError::ValidationError(format!(
                "audit.backend must be \"supabase\" or \"postgres\", got \"{}\"",
                self.audit.backend
            )));
        }

        if !matches!(self.logging.format.as_str(), "json" | "text") {
            return Err(ConfigError::ValidationError(format!(
                "logging.format must be \"json\" or \"text\", got \"{}\"",
                self.logging.format
            )));
        }

        Ok(())
    }

    /// Whether an LLM credential is present (selects the LLM-backed mode).
    pub fn has_llm_key(&self) -> bool {
        self.llm.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.gateway.port, 3000);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.max_tokens, 200);
        assert!(!config.has_llm_key());
        assert!(!config.audit.is_configured());
    }

    #[test]
    fn config_roundtrip_toml() {
        let toml_str = toml::to_string_pretty(&AppConfig::default()).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.llm.model, "gpt-4o-mini");
        assert_eq!(parsed.gateway.port, 3000);
        assert_eq!(parsed.audit.table, "messages");
    }

    #[test]
    fn invalid_temperature_rejected() {
        let mut config = AppConfig::default();
        config.llm.temperature = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_audit_backend_rejected() {
        let mut config = AppConfig::default();
        config.audit.backend = "mysql".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn missing_config_file_returns_defaults() {
        let config = AppConfig::load_from(Path::new("/nonexistent/askrelay.toml")).unwrap();
        assert_eq!(config.gateway.port, 3000);
    }

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[llm]
model = "gpt-4o"

[gateway]
port = 8081

[logging]
format = "text"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.max_tokens, 200);
        assert_eq!(config.gateway.port, 8081);
        assert_eq!(config.logging.format, "text");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[llm\nmodel = ").unwrap();
        assert!(matches!(
            AppConfig::load_from(file.path()),
            Err(ConfigError::ParseError { .. })
        ));
    }

    #[test]
    fn env_overrides_apply() {
        let vars = env(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("OPENAI_MODEL", "gpt-4.1-mini"),
            ("SUPABASE_URL", "https://proj.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("PORT", "4000"),
        ]);
        let mut config = AppConfig::default();
        config.apply_env_with(|k| vars.get(k).cloned()).unwrap();

        assert!(config.has_llm_key());
        assert_eq!(config.llm.model, "gpt-4.1-mini");
        assert!(config.audit.is_configured());
        assert_eq!(config.gateway.port, 4000);
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let vars = env(&[("OPENAI_API_KEY", ""), ("SUPABASE_URL", "  ")]);
        let mut config = AppConfig::default();
        config.apply_env_with(|k| vars.get(k).cloned()).unwrap();
        assert!(!config.has_llm_key());
        assert!(config.audit.url.is_none());
    }

    #[test]
    fn supabase_needs_url_and_key() {
        let vars = env(&[("SUPABASE_URL", "https://proj.supabase.co")]);
        let mut config = AppConfig::default();
        config.apply_env_with(|k| vars.get(k).cloned()).unwrap();
        assert!(!config.audit.is_configured());
    }

    #[test]
    fn postgres_backend_needs_database_url() {
        let mut config = AppConfig::default();
        config.audit.backend = "postgres".into();
        assert!(!config.audit.is_configured());
        config.audit.database_url = Some("postgres://localhost/app".into());
        assert!(config.audit.is_configured());
    }

    #[test]
    fn bad_port_rejected() {
        let vars = env(&[("PORT", "http")]);
        let mut config = AppConfig::default();
        assert!(config.apply_env_with(|k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("sk-very-secret".into());
        config.audit.service_key = Some("service-secret".into());
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-very-secret"));
        assert!(!debug.contains("service-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
