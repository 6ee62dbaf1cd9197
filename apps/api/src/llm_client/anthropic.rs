//! Anthropic Messages API backend.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    http_client, non_empty, read_credential, send_json, Backend, ClientConfig, CompletionClient,
    CompletionError, CompletionOptions,
};

pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const ANTHROPIC_VERSION: &str = "2023-06-01";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<AnthropicMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlock>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicResponse {
    /// Concatenates every text block in order.
    fn text(&self) -> String {
        self.content
            .iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text.as_deref())
            .collect()
    }
}

/// Completion client for Claude models.
#[derive(Clone)]
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl AnthropicClient {
    /// Reads `ANTHROPIC_API_KEY` once. Fails with `CredentialMissing` before any request.
    pub fn from_env(config: &ClientConfig) -> Result<Self, CompletionError> {
        let api_key = read_credential(Backend::Anthropic, |key| std::env::var(key).ok())?;
        Self::new(api_key, config)
    }

    pub fn new(api_key: impl Into<String>, config: &ClientConfig) -> Result<Self, CompletionError> {
        let api_key = read_credential(Backend::Anthropic, |_| Some(api_key.into()))?;
        Ok(Self {
            http: http_client(Backend::Anthropic)?,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/v1/messages", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CompletionClient for AnthropicClient {
    fn backend(&self) -> Backend {
        Backend::Anthropic
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let body = AnthropicRequest {
            model: &self.model,
            max_tokens: options.max_output_tokens,
            temperature: options.temperature,
            system: options.system.as_deref(),
            messages: vec![AnthropicMessage {
                role: "user",
                content: prompt,
            }],
        };

        let request = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body);

        let response: AnthropicResponse =
            send_json(Backend::Anthropic, request, options.timeout).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Anthropic call succeeded: input_tokens={}, output_tokens={}",
                usage.input_tokens, usage.output_tokens
            );
        }

        non_empty(Backend::Anthropic, response.text())
    }
}
