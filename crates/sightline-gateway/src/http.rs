//! HTTP gateway, one instance per backend

use crate::base::{Backend, BackendError, BackendRequest, BackendResponse};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Url};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct HttpGateway {
    name: String,
    base_url: String,
    client: Client,
    bearer_token: Option<String>,
}

impl HttpGateway {
    /// `client` is shared between gateways; it pools connections per host
    pub fn new(name: &str, base_url: &str, client: Client) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            bearer_token: None,
        }
    }

    pub fn with_bearer_token(mut self, token: Option<String>) -> Self {
        self.bearer_token = token;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str, params: &[(&str, String)]) -> Result<Url, BackendError> {
        let raw = format!("{}{}", self.base_url, path);
        let parsed = if params.is_empty() {
            Url::parse(&raw)
        } else {
            Url::parse_with_params(&raw, params)
        };
        parsed.map_err(|e| BackendError::Unreachable(format!("invalid URL {}: {}", raw, e)))
    }

    fn build(&self, request: &BackendRequest) -> Result<RequestBuilder, BackendError> {
        let builder = match request {
            BackendRequest::GraphGoals {
                goal,
                selector,
                constraint,
            } => {
                let body = BackendRequest::goals_body(*goal, selector, constraint);
                self.client
                    .post(self.url("/api/v1alpha1/graphs/goals", &[])?)
                    .json(&body)
            }
            BackendRequest::RangeQuery {
                query,
                window,
                step,
            } => {
                let params = [
                    ("query", query.clone()),
                    ("start", window.start_ts().to_string()),
                    ("end", window.end_ts().to_string()),
                    ("step", format!("{}s", step)),
                ];
                self.client.get(self.url("/api/v1/query_range", &params)?)
            }
            BackendRequest::TraceById { trace_id } => {
                let mut url = self.url("/api/traces", &[])?;
                url.path_segments_mut()
                    .map_err(|_| BackendError::Unreachable(format!("invalid base URL {}", self.base_url)))?
                    .push(trace_id);
                self.client.get(url)
            }
            BackendRequest::TraceSearch {
                service,
                limit,
                window,
            } => {
                let params = [
                    ("service.name", service.clone()),
                    ("limit", limit.to_string()),
                    ("start", window.start_ts().to_string()),
                    ("end", window.end_ts().to_string()),
                ];
                self.client.get(self.url("/api/search", &params)?)
            }
        };

        Ok(match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        })
    }

    async fn send(&self, request: &BackendRequest) -> Result<BackendResponse, BackendError> {
        let response = self
            .build(request)?
            .send()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::HttpStatus(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| BackendError::Unreachable(e.to_string()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(BackendResponse::empty());
        }

        let body = serde_json::from_slice(&bytes)
            .map_err(|e| BackendError::Malformed(e.to_string()))?;
        Ok(BackendResponse::new(body))
    }
}

#[async_trait]
impl Backend for HttpGateway {
    fn name(&self) -> &str {
        &self.name
    }

    async fn call(
        &self,
        request: BackendRequest,
        timeout: Duration,
    ) -> Result<BackendResponse, BackendError> {
        debug!("{} <- {}", self.name, request.key());
        match tokio::time::timeout(timeout, self.send(&request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Timeout(timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightline_core::TimeWindow;

    fn built_url(gateway: &HttpGateway, request: BackendRequest) -> Url {
        gateway.build(&request).unwrap().build().unwrap().url().clone()
    }

    fn gateway() -> HttpGateway {
        HttpGateway::new("metrics", "http://prometheus:9090/", Client::new())
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        assert_eq!(gateway().base_url(), "http://prometheus:9090");
    }

    #[test]
    fn test_range_query_url() {
        let window = TimeWindow::new(1_000, 4_600).unwrap();
        let url = built_url(&gateway(), BackendRequest::range_query("rate(x{a=\"b\"}[5m])", window));
        assert_eq!(url.path(), "/api/v1/query_range");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("query".to_string(), "rate(x{a=\"b\"}[5m])".to_string()));
        assert_eq!(pairs[1].1, "1000");
        assert_eq!(pairs[3].1, "30s");
    }

    #[test]
    fn test_bearer_token_sent() {
        let gateway = gateway().with_bearer_token(Some("s3cret".to_string()));
        let request = gateway
            .build(&BackendRequest::trace_by_id("abc"))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(request.url().path(), "/api/traces/abc");
        assert_eq!(
            request.headers()["authorization"].to_str().unwrap(),
            "Bearer s3cret"
        );
    }

    #[test]
    fn test_trace_id_stays_one_path_segment() {
        let url = built_url(&gateway(), BackendRequest::trace_by_id("../v1/query?x=1"));
        assert_eq!(url.path(), "/api/traces/..%2Fv1%2Fquery%3Fx=1");
        assert_eq!(url.query(), None);
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        let gateway = HttpGateway::new("traces", "http://127.0.0.1:1", Client::new());
        let err = gateway
            .call(BackendRequest::trace_by_id("abc"), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BackendError::Unreachable(_) | BackendError::Timeout(_)
        ));
    }
}
