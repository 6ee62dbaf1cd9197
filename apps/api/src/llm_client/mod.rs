/// LLM Client — the single point of entry for all text-generation calls in Tailor.
///
/// ARCHITECTURAL RULE: No other module may call a provider API directly.
/// Callers hold an `Arc<dyn CompletionClient>` chosen once by `build_client`;
/// nothing downstream branches on which provider is behind it.
///
/// No call is ever retried here. Retry policy belongs to whoever calls the workflow.
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

pub mod anthropic;
pub mod openai;
pub mod prompts;

#[cfg(test)]
pub(crate) mod stub;

pub use anthropic::AnthropicClient;
pub use openai::OpenAiClient;

// ────────────────────────────────────────────────────────────────────────────
// Backend selection
// ────────────────────────────────────────────────────────────────────────────

/// Hosted model provider addressed by a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Anthropic,
    #[serde(rename = "openai")]
    OpenAi,
}

impl Backend {
    /// Environment variable holding this provider's API key.
    pub fn credential_variable(self) -> &'static str {
        match self {
            Backend::Anthropic => "ANTHROPIC_API_KEY",
            Backend::OpenAi => "OPENAI_API_KEY",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Backend::Anthropic => anthropic::DEFAULT_MODEL,
            Backend::OpenAi => openai::DEFAULT_MODEL,
        }
    }

    pub fn default_base_url(self) -> &'static str {
        match self {
            Backend::Anthropic => anthropic::DEFAULT_BASE_URL,
            Backend::OpenAi => openai::DEFAULT_BASE_URL,
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::Anthropic => f.write_str("anthropic"),
            Backend::OpenAi => f.write_str("openai"),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown completion backend '{0}'")]
pub struct ParseBackendError(String);

impl FromStr for Backend {
    type Err = ParseBackendError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" => Ok(Backend::Anthropic),
            "openai" => Ok(Backend::OpenAi),
            other => Err(ParseBackendError(other.to_string())),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Configuration
// ────────────────────────────────────────────────────────────────────────────

/// Construction-time configuration. Fixed for the life of a client.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    pub backend: Backend,
    pub model: String,
    pub base_url: String,
}

impl ClientConfig {
    pub fn new(backend: Backend) -> Self {
        Self {
            backend,
            model: backend.default_model().to_string(),
            base_url: backend.default_base_url().to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

/// Per-call generation options.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Upper bound on the whole call, body included. No partial text survives expiry.
    pub timeout: Duration,
    pub system: Option<String>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 4096,
            timeout: Duration::from_secs(120),
            system: None,
        }
    }
}

impl CompletionOptions {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("{variable} is not set; configure a {backend} API key and restart")]
    CredentialMissing {
        backend: Backend,
        variable: &'static str,
    },

    #[error("{backend} backend error: {message}")]
    Backend { backend: Backend, message: String },

    #[error("{backend} backend timed out after {}s", .after.as_secs())]
    Timeout { backend: Backend, after: Duration },

    #[error("{backend} backend returned an empty response")]
    EmptyResponse { backend: Backend },
}

impl CompletionError {
    pub fn backend(&self) -> Backend {
        match self {
            CompletionError::CredentialMissing { backend, .. }
            | CompletionError::Backend { backend, .. }
            | CompletionError::Timeout { backend, .. }
            | CompletionError::EmptyResponse { backend } => *backend,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Text-completion capability. Implement this to add a provider without
/// touching the workflow, handlers, or any other caller.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    fn backend(&self) -> Backend;

    /// Sends `prompt` and returns the full generated text, never an empty string.
    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError>;
}

/// Builds the configured backend. Reads the provider credential exactly once.
pub fn build_client(config: &ClientConfig) -> Result<Arc<dyn CompletionClient>, CompletionError> {
    Ok(match config.backend {
        Backend::Anthropic => Arc::new(AnthropicClient::from_env(config)?),
        Backend::OpenAi => Arc::new(OpenAiClient::from_env(config)?),
    })
}

/// Reads a credential, treating a blank value the same as an absent one.
pub(crate) fn read_credential<F>(backend: Backend, lookup: F) -> Result<String, CompletionError>
where
    F: FnOnce(&str) -> Option<String>,
{
    let variable = backend.credential_variable();
    lookup(variable)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(CompletionError::CredentialMissing { backend, variable })
}

pub(crate) fn http_client(backend: Backend) -> Result<reqwest::Client, CompletionError> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| CompletionError::Backend {
            backend,
            message: format!("failed to build HTTP client: {e}"),
        })
}

// ────────────────────────────────────────────────────────────────────────────
// Shared HTTP plumbing
// ────────────────────────────────────────────────────────────────────────────

/// Error envelope shared by the Anthropic and OpenAI APIs.
#[derive(Debug, Deserialize)]
struct ProviderError {
    error: ProviderErrorBody,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorBody {
    message: String,
}

/// Sends a prepared request, bounded by `timeout`, and decodes a JSON body.
pub(crate) async fn send_json<T: DeserializeOwned>(
    backend: Backend,
    request: RequestBuilder,
    timeout: Duration,
) -> Result<T, CompletionError> {
    let exchange = async {
        let response = request.send().await.map_err(|e| map_reqwest(backend, e, timeout))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest(backend, e, timeout))?;

        if !status.is_success() {
            warn!("{backend} API returned {status}");
            let message = serde_json::from_str::<ProviderError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(CompletionError::Backend {
                backend,
                message: format!("status {}: {message}", status.as_u16()),
            });
        }

        serde_json::from_str::<T>(&body).map_err(|e| CompletionError::Backend {
            backend,
            message: format!("malformed response: {e}"),
        })
    };

    match tokio::time::timeout(timeout, exchange).await {
        Ok(result) => result,
        Err(_) => Err(CompletionError::Timeout {
            backend,
            after: timeout,
        }),
    }
}

fn map_reqwest(backend: Backend, err: reqwest::Error, timeout: Duration) -> CompletionError {
    if err.is_timeout() {
        CompletionError::Timeout {
            backend,
            after: timeout,
        }
    } else {
        CompletionError::Backend {
            backend,
            message: err.to_string(),
        }
    }
}

/// Rejects whitespace-only output so an empty document is never produced.
pub(crate) fn non_empty(backend: Backend, text: String) -> Result<String, CompletionError> {
    if text.trim().is_empty() {
        Err(CompletionError::EmptyResponse { backend })
    } else {
        Ok(text)
    }
}

/// Strips one ```latex / ```tex / ``` fence pair wrapping the whole output.
/// Output holding more than one fenced block is returned unchanged.
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "latex") on the opening fence line.
    let rest = match rest.find('\n') {
        Some(newline) if !rest[..newline].contains(char::is_whitespace) => &rest[newline + 1..],
        _ => rest,
    };
    match rest.trim_end().strip_suffix("```") {
        Some(inner) if !inner.lines().any(|line| line.trim_start().starts_with("```")) => {
            inner.trim_matches('\n')
        }
        _ => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_parses_case_insensitively() {
        assert_eq!("Anthropic".parse::<Backend>().unwrap(), Backend::Anthropic);
        assert_eq!(" OPENAI ".parse::<Backend>().unwrap(), Backend::OpenAi);
        assert!("gemini".parse::<Backend>().is_err());
        assert!("claude".parse::<Backend>().is_err());
        assert!("gpt".parse::<Backend>().is_err());
    }

    #[test]
    fn test_backend_display_round_trips_through_parse() {
        for backend in [Backend::Anthropic, Backend::OpenAi] {
            assert_eq!(backend.to_string().parse::<Backend>().unwrap(), backend);
        }
    }

    #[test]
    fn test_read_credential_missing() {
        let err = read_credential(Backend::OpenAi, |_| None).unwrap_err();
        assert!(matches!(
            err,
            CompletionError::CredentialMissing {
                backend: Backend::OpenAi,
                variable: "OPENAI_API_KEY"
            }
        ));
    }

    #[test]
    fn test_read_credential_blank_counts_as_missing() {
        let err = read_credential(Backend::Anthropic, |_| Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, CompletionError::CredentialMissing { .. }));
    }

    #[test]
    fn test_read_credential_present() {
        let key = read_credential(Backend::Anthropic, |_| Some("sk-test".to_string())).unwrap();
        assert_eq!(key, "sk-test");
    }

    #[test]
    fn test_non_empty_rejects_whitespace() {
        assert!(matches!(
            non_empty(Backend::Anthropic, " \n ".to_string()),
            Err(CompletionError::EmptyResponse { .. })
        ));
        assert_eq!(non_empty(Backend::Anthropic, "ok".to_string()).unwrap(), "ok");
    }

    #[test]
    fn test_strip_code_fences_with_latex_tag() {
        let input = "```latex\n\\documentclass{article}\n```";
        assert_eq!(strip_code_fences(input), "\\documentclass{article}");
    }

    #[test]
    fn test_strip_code_fences_without_tag() {
        let input = "```\nDear hiring manager,\n```";
        assert_eq!(strip_code_fences(input), "Dear hiring manager,");
    }

    #[test]
    fn test_strip_code_fences_no_fences() {
        let input = "Dear hiring manager,";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_strip_code_fences_leaves_multiple_blocks_alone() {
        let input = "```latex\n\\section{A}\n```\nand\n```latex\n\\section{B}\n```";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_strip_code_fences_unterminated_is_untouched() {
        let input = "```latex\n\\section{Skills}";
        assert_eq!(strip_code_fences(input), input);
    }

    #[test]
    fn test_client_config_defaults_follow_backend() {
        let config = ClientConfig::new(Backend::OpenAi);
        assert_eq!(config.model, openai::DEFAULT_MODEL);
        assert_eq!(config.base_url, openai::DEFAULT_BASE_URL);
        let config = config.with_base_url("http://localhost:1234/");
        assert_eq!(config.base_url, "http://localhost:1234");
    }
}
