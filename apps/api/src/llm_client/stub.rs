//! Scripted completion client for tests.

use std::sync::Mutex;

use async_trait::async_trait;

use super::{Backend, CompletionClient, CompletionError, CompletionOptions};

type Responder = dyn Fn(usize, &str) -> Result<String, CompletionError> + Send + Sync;

/// Answers each call through a closure given the zero-based call index and the prompt.
/// Every prompt received is recorded in order.
pub(crate) struct ScriptedClient {
    responder: Box<Responder>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedClient {
    pub(crate) fn new<F>(responder: F) -> Self
    where
        F: Fn(usize, &str) -> Result<String, CompletionError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Returns the given responses in order, failing once they run out.
    pub(crate) fn with_responses(responses: Vec<&'static str>) -> Self {
        Self::new(move |index, _| {
            responses
                .get(index)
                .map(|r| r.to_string())
                .ok_or_else(|| CompletionError::Backend {
                    backend: Backend::Anthropic,
                    message: format!("no scripted response for call {index}"),
                })
        })
    }

    pub(crate) fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    fn backend(&self) -> Backend {
        Backend::Anthropic
    }

    async fn complete(
        &self,
        prompt: &str,
        _options: &CompletionOptions,
    ) -> Result<String, CompletionError> {
        let index = {
            let mut prompts = self.prompts.lock().unwrap();
            prompts.push(prompt.to_string());
            prompts.len() - 1
        };
        (self.responder)(index, prompt)
    }
}
