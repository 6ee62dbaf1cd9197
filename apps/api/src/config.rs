use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::generation::assembler::DEFAULT_MARKER;
use crate::llm_client::{Backend, ClientConfig, CompletionOptions};

const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Application configuration loaded from environment variables.
///
/// Provider credentials are deliberately absent: each completion client reads
/// its own key once at construction.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub model: Option<String>,
    pub base_url: Option<String>,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    pub templates_dir: PathBuf,
    pub cover_letter_marker: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = match lookup("COMPLETION_BACKEND") {
            Some(raw) => raw
                .parse::<Backend>()
                .context("COMPLETION_BACKEND must be 'anthropic' or 'openai'")?,
            None => Backend::Anthropic,
        };

        Ok(Config {
            backend,
            model: non_blank(lookup("COMPLETION_MODEL")),
            base_url: non_blank(lookup("COMPLETION_BASE_URL")),
            temperature: parse_or(&lookup, "COMPLETION_TEMPERATURE", DEFAULT_TEMPERATURE)?,
            max_output_tokens: parse_or(&lookup, "COMPLETION_MAX_TOKENS", DEFAULT_MAX_TOKENS)?,
            timeout: Duration::from_secs(parse_or(
                &lookup,
                "COMPLETION_TIMEOUT_SECS",
                DEFAULT_TIMEOUT_SECS,
            )?),
            templates_dir: lookup("TEMPLATES_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./templates")),
            cover_letter_marker: non_blank(lookup("COVER_LETTER_MARKER"))
                .unwrap_or_else(|| DEFAULT_MARKER.to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
        })
    }

    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new(self.backend);
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(base_url) = &self.base_url {
            config = config.with_base_url(base_url.clone());
        }
        config
    }

    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_output_tokens: self.max_output_tokens,
            timeout: self.timeout,
            system: None,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = Config::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.backend, Backend::Anthropic);
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_output_tokens, 4096);
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.cover_letter_marker, "[COVER_LETTER_BODY]");
        assert_eq!(config.templates_dir, PathBuf::from("./templates"));
        assert!(config.model.is_none());
    }

    #[test]
    fn test_overrides_are_parsed() {
        let config = Config::from_lookup(lookup_from(&[
            ("COMPLETION_BACKEND", "OpenAI"),
            ("COMPLETION_MODEL", "gpt-4o-mini"),
            ("COMPLETION_TEMPERATURE", "0.2"),
            ("COMPLETION_TIMEOUT_SECS", "30"),
            ("COVER_LETTER_MARKER", "%%BODY%%"),
            ("PORT", "9000"),
        ]))
        .unwrap();
        assert_eq!(config.backend, Backend::OpenAi);
        assert_eq!(config.model.as_deref(), Some("gpt-4o-mini"));
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.cover_letter_marker, "%%BODY%%");
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "not-a-port")])).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn test_unknown_backend_is_rejected() {
        assert!(Config::from_lookup(lookup_from(&[("COMPLETION_BACKEND", "llama")])).is_err());
    }

    #[test]
    fn test_client_config_carries_model_override() {
        let config =
            Config::from_lookup(lookup_from(&[("COMPLETION_MODEL", "claude-haiku-4-5")])).unwrap();
        assert_eq!(config.client_config().model, "claude-haiku-4-5");
    }
}
