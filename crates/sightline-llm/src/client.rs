//! Completions clients

use crate::error::LlmError;
use crate::prompt::STOP_SEQUENCES;
use async_trait::async_trait;
use serde_json::Value;
use sightline_core::LlmConfig;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete `prompt` and return the raw completion text
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// Client for an OpenAI-style `/v1/completions` endpoint
#[derive(Debug, Clone)]
pub struct HttpLlmClient {
    client: reqwest::Client,
    config: LlmConfig,
}

impl HttpLlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    fn request_body(&self, prompt: &str) -> Value {
        serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "max_tokens": self.config.max_tokens,
            "temperature": self.config.temperature,
            "stop": STOP_SEQUENCES,
        })
    }

    async fn send(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/completions", self.config.endpoint.trim_end_matches('/'));
        let mut request = self.client.post(&url).json(&self.request_body(prompt));
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| LlmError::Unavailable(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::HttpStatus(status.as_u16()));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| LlmError::Malformed(e.to_string()))?;
        completion_text(&body)
    }
}

/// `choices[0].text` of a completions reply
fn completion_text(body: &Value) -> Result<String, LlmError> {
    let text = body
        .get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .ok_or_else(|| LlmError::Malformed("missing choices[0].text".to_string()))?;
    if text.trim().is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text.to_string())
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!("LLM request to {} ({} chars)", self.config.model, prompt.len());
        let timeout = Duration::from_secs(self.config.timeout_secs);
        match tokio::time::timeout(timeout, self.send(prompt)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout(self.config.timeout_secs)),
        }
    }
}

/// Scripted LLM for tests. Replies are consumed in order; once exhausted
/// every call fails with `Unavailable`.
#[derive(Debug, Default)]
pub struct FakeLlmClient {
    replies: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(text.to_string()))
    }

    pub fn error(self, error: LlmError) -> Self {
        self.push(Err(error))
    }

    fn push(self, reply: Result<String, LlmError>) -> Self {
        if let Ok(mut replies) = self.replies.lock() {
            replies.push_back(reply);
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }

    /// Every prompt received so far
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for FakeLlmClient {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(LlmError::Unavailable("no scripted reply".to_string())))
    }
}
