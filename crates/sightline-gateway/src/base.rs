//! Backend capability and request/response types

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use sightline_core::{Constraint, SignalKind, SignalSelector, TimeWindow};
use std::time::Duration;
use thiserror::Error;

/// One logical request to an external backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "request", rename_all = "snake_case")]
pub enum BackendRequest {
    /// Walk the correlation graph from `selector` towards `goal`
    GraphGoals {
        goal: SignalKind,
        selector: SignalSelector,
        constraint: Constraint,
    },
    RangeQuery {
        query: String,
        window: TimeWindow,
        step: i64,
    },
    TraceById {
        trace_id: String,
    },
    TraceSearch {
        service: String,
        limit: usize,
        window: TimeWindow,
    },
}

impl BackendRequest {
    pub fn range_query(query: &str, window: TimeWindow) -> Self {
        BackendRequest::RangeQuery {
            query: query.to_string(),
            window,
            step: window.step_secs(),
        }
    }

    pub fn trace_by_id(trace_id: &str) -> Self {
        BackendRequest::TraceById {
            trace_id: trace_id.to_string(),
        }
    }

    /// Stable identity used for logging and scripted replies
    pub fn key(&self) -> String {
        match self {
            BackendRequest::GraphGoals { selector, goal, .. } => {
                format!("goals:{}->{}", selector.to_query(), goal.as_str())
            }
            BackendRequest::RangeQuery { query, .. } => format!("range:{}", query),
            BackendRequest::TraceById { trace_id } => format!("trace:{}", trace_id),
            BackendRequest::TraceSearch { service, .. } => format!("search:{}", service),
        }
    }

    /// JSON body for the correlation graph's goals endpoint
    pub fn goals_body(goal: SignalKind, selector: &SignalSelector, constraint: &Constraint) -> Value {
        serde_json::json!({
            "goals": [goal.as_str()],
            "start": {
                "class": selector.class(),
                "queries": [selector.to_query()],
                "constraint": {
                    "limit": constraint.limit,
                    "timeout": constraint.timeout,
                },
            },
        })
    }
}

/// Successful reply. A `Null` body means the backend had nothing to say.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendResponse {
    pub body: Value,
}

impl BackendResponse {
    pub fn new(body: Value) -> Self {
        Self { body }
    }

    pub fn empty() -> Self {
        Self { body: Value::Null }
    }

    pub fn is_empty(&self) -> bool {
        match &self.body {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    #[error("backend unreachable: {0}")]
    Unreachable(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// A single external backend. Implementations never retry.
#[async_trait]
pub trait Backend: Send + Sync {
    fn name(&self) -> &str;

    async fn call(
        &self,
        request: BackendRequest,
        timeout: Duration,
    ) -> Result<BackendResponse, BackendError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goals_body_shape() {
        let body = BackendRequest::goals_body(
            SignalKind::Trace,
            &SignalSelector::metric("cpu_usage_percent"),
            &Constraint::default(),
        );
        assert_eq!(body["goals"][0], "trace");
        assert_eq!(body["start"]["class"], "metric:prometheus");
        assert_eq!(body["start"]["queries"][0], "metric:cpu_usage_percent");
        assert_eq!(body["start"]["constraint"]["limit"], 100);
        assert_eq!(body["start"]["constraint"]["timeout"], "30s");
    }

    #[test]
    fn test_empty_response() {
        assert!(BackendResponse::empty().is_empty());
        assert!(BackendResponse::new(serde_json::json!({})).is_empty());
        assert!(!BackendResponse::new(serde_json::json!({"results": []})).is_empty());
    }

    #[test]
    fn test_request_keys() {
        assert_eq!(BackendRequest::trace_by_id("abc").key(), "trace:abc");
        let window = TimeWindow::new(0, 3600).unwrap();
        assert_eq!(BackendRequest::range_query("up", window).key(), "range:up");
    }
}
