//! Scripted backend for deterministic tests

use crate::base::{Backend, BackendError, BackendRequest, BackendResponse};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Pre-configured reply for one request key
#[derive(Debug, Clone)]
pub struct FakeReply {
    pub result: Result<Value, BackendError>,
    pub delay: Option<Duration>,
}

impl FakeReply {
    pub fn ok(body: Value) -> Self {
        Self {
            result: Ok(body),
            delay: None,
        }
    }

    pub fn empty() -> Self {
        Self::ok(Value::Null)
    }

    pub fn error(error: BackendError) -> Self {
        Self {
            result: Err(error),
            delay: None,
        }
    }

    /// Hold the reply back; a delay past the caller's timeout becomes `Timeout`
    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// Backend that answers from a script keyed by [`BackendRequest::key`]
#[derive(Debug)]
pub struct FakeBackend {
    name: String,
    replies: HashMap<String, FakeReply>,
    fallback: FakeReply,
    calls: Mutex<Vec<String>>,
}

impl FakeBackend {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            replies: HashMap::new(),
            fallback: FakeReply::empty(),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn reply(mut self, key: &str, reply: FakeReply) -> Self {
        self.replies.insert(key.to_string(), reply);
        self
    }

    /// Reply used for keys with no scripted entry
    pub fn fallback(mut self, reply: FakeReply) -> Self {
        self.fallback = reply;
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// Keys of every request received, in arrival order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Backend for FakeBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        request: BackendRequest,
        timeout: Duration,
    ) -> Result<BackendResponse, BackendError> {
        let key = request.key();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }

        let reply = self.replies.get(&key).unwrap_or(&self.fallback).clone();
        if let Some(delay) = reply.delay {
            if delay > timeout {
                tokio::time::sleep(timeout).await;
                return Err(BackendError::Timeout(timeout));
            }
            tokio::time::sleep(delay).await;
        }
        reply.result.map(BackendResponse::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_scripted_replies_and_counts() {
        let fake = FakeBackend::new("traces")
            .reply("trace:t1", FakeReply::ok(json!({"batches": []})))
            .reply("trace:t2", FakeReply::error(BackendError::HttpStatus(503)));

        let timeout = Duration::from_secs(1);
        assert!(fake.call(BackendRequest::trace_by_id("t1"), timeout).await.is_ok());
        assert_eq!(
            fake.call(BackendRequest::trace_by_id("t2"), timeout).await,
            Err(BackendError::HttpStatus(503))
        );
        let unscripted = fake.call(BackendRequest::trace_by_id("t3"), timeout).await.unwrap();
        assert!(unscripted.is_empty());

        assert_eq!(fake.call_count(), 3);
        assert_eq!(fake.calls()[1], "trace:t2");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_past_timeout() {
        let fake = FakeBackend::new("metrics")
            .fallback(FakeReply::empty().delayed(Duration::from_secs(60)));
        let err = fake
            .call(BackendRequest::trace_by_id("slow"), Duration::from_secs(30))
            .await
            .unwrap_err();
        assert_eq!(err, BackendError::Timeout(Duration::from_secs(30)));
    }
}
