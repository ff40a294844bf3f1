//! The three backends a request can reach

use crate::base::Backend;
use crate::http::HttpGateway;
use sightline_core::Config;
use std::sync::Arc;
use std::time::Duration;

/// Correlation graph, metrics store and trace store, plus the per-call timeout
#[derive(Clone)]
pub struct Gateways {
    pub graph: Arc<dyn Backend>,
    pub metrics: Arc<dyn Backend>,
    pub traces: Arc<dyn Backend>,
    pub timeout: Duration,
}

impl Gateways {
    pub fn new(
        graph: Arc<dyn Backend>,
        metrics: Arc<dyn Backend>,
        traces: Arc<dyn Backend>,
        timeout: Duration,
    ) -> Self {
        Self {
            graph,
            metrics,
            traces,
            timeout,
        }
    }

    /// HTTP gateways sharing one connection pool
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::new();
        let backends = &config.backends;
        Self {
            graph: Arc::new(HttpGateway::new("korrel8r", &backends.korrel8r_url, client.clone())),
            metrics: Arc::new(
                HttpGateway::new("prometheus", &backends.prometheus_url, client.clone())
                    .with_bearer_token(backends.bearer_token.clone()),
            ),
            traces: Arc::new(HttpGateway::new("tempo", &backends.tempo_url, client)),
            timeout: config.backend_timeout(),
        }
    }
}

impl std::fmt::Debug for Gateways {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateways")
            .field("graph", &self.graph.name())
            .field("metrics", &self.metrics.name())
            .field("traces", &self.traces.name())
            .field("timeout", &self.timeout)
            .finish()
    }
}
