//! OpenAI Chat Completions backend.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    http_client, non_empty, read_credential, send_json, Backend, ClientConfig, CompletionClient,
    CompletionError, CompletionOptions,
};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

/// Completion client for OpenAI-compatible chat endpoints.
#[derive(Clone)]
pub struct OpenAiClient {
    http: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiClient {
    /// Reads `OPENAI_API_KEY` once. Fails with `CredentialMissing` before any request.
    pub fn from_env(config: &ClientConfig) -> Result<Self, CompletionError> {
        let api_key = read_credential(Backend::OpenAi, |key| std::env::var(key).ok())?;
        Self::new(api_key, config)
    }

    pub fn new(api_key: impl Into<String>, config: &ClientConfig) -> Result<Self, CompletionError> {
        let api_key = read_credential(Backend::OpenAi, |_| Some(api_key.into()))?;
        Ok(Self {
            http: http_client(Backend::OpenAi)?,
            api_key,
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn backend(&self) -> Backend {
        Backend::OpenAi
    }

    async fn complete(
        &self,
        prompt: &str,
        options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system.as_deref() {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let body = ChatRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_output_tokens,
        };

        let request = self
            .http
            .post(&self.endpoint)
            .header(header::AUTHORIZATION, format!("Bearer {}", self.api_key))
            .json(&body);

        let response: ChatResponse = send_json(Backend::OpenAi, request, options.timeout).await?;

        if let Some(usage) = &response.usage {
            debug!(
                "OpenAI call succeeded: prompt_tokens={}, completion_tokens={}",
                usage.prompt_tokens, usage.completion_tokens
            );
        }

        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();

        non_empty(Backend::OpenAi, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, header as header_eq, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> OpenAiClient {
        let config = ClientConfig::new(Backend::OpenAi).with_base_url(server.uri());
        OpenAiClient::new("sk-test", &config).unwrap()
    }

    #[tokio::test]
    async fn test_complete_sends_system_and_user_messages() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header_eq("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": DEFAULT_MODEL,
                "max_tokens": 512,
                "messages": [
                    {"role": "system", "content": "latex only"},
                    {"role": "user", "content": "write the letter"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Dear team,"}}],
                "usage": {"prompt_tokens": 12, "completion_tokens": 3}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let options = CompletionOptions {
            max_output_tokens: 512,
            ..CompletionOptions::default()
        }
        .with_system("latex only");
        let text = client_for(&server)
            .complete("write the letter", &options)
            .await
            .unwrap();
        assert_eq!(text, "Dear team,");
    }

    #[tokio::test]
    async fn test_null_content_is_empty_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": null}}]
            })))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("p", &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CompletionError::EmptyResponse {
                backend: Backend::OpenAi
            }
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server)
            .complete("p", &CompletionOptions::default())
            .await
            .unwrap_err();
        match err {
            CompletionError::Backend { message, .. } => {
                assert!(message.contains("upstream unavailable"))
            }
            other => panic!("expected Backend error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({
                        "choices": [{"message": {"content": "late"}}]
                    }))
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let options = CompletionOptions {
            timeout: Duration::from_millis(100),
            ..CompletionOptions::default()
        };
        let err = client_for(&server).complete("p", &options).await.unwrap_err();
        assert!(matches!(err, CompletionError::Timeout { .. }));
    }
}
