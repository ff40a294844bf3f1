//! Configuration for backends, correlation and the LLM

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::signal::Constraint;

/// Endpoints of the three observability backends
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub korrel8r_url: String,
    pub prometheus_url: String,
    pub tempo_url: String,
    /// Per-call timeout for graph, metrics and trace requests
    pub timeout_secs: u64,
    /// Sent to the metrics backend only
    pub bearer_token: Option<String>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            korrel8r_url: "http://korrel8r:8080".to_string(),
            prometheus_url: "http://prometheus:9090".to_string(),
            tempo_url: "http://tempo:3200".to_string(),
            timeout_secs: 30,
            bearer_token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorrelationConfig {
    pub limit: usize,
    pub constraint_timeout: String,
    /// Max traces returned by a service search
    pub max_search_traces: usize,
}

impl CorrelationConfig {
    pub fn constraint(&self) -> Constraint {
        Constraint {
            limit: self.limit,
            timeout: self.constraint_timeout.clone(),
        }
    }
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            limit: 100,
            constraint_timeout: "30s".to_string(),
            max_search_traces: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub api_key: Option<String>,
    /// Estimated-token ceiling for the evidence section of a prompt
    pub prompt_token_budget: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://llm-d-inference-gateway-istio.llm-d.svc.cluster.local:80"
                .to_string(),
            model: "llama-3.2-3b-instruct".to_string(),
            max_tokens: 4096,
            temperature: 0.1,
            timeout_secs: 60,
            api_key: None,
            prompt_token_budget: 6000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backends: BackendConfig,
    pub correlation: CorrelationConfig,
    pub llm: LlmConfig,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON config file; missing fields take their defaults
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&contents)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Defaults, then the optional file, then environment overrides
    pub fn resolve(path: Option<&Path>) -> anyhow::Result<Self> {
        let mut config = match path {
            Some(p) if p.exists() => {
                debug!("Loading config from {}", p.display());
                Self::load(p)?
            }
            _ => Self::new(),
        };
        config.apply_env()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> anyhow::Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from a key lookup; unparsable numbers are an error
    pub fn apply_overrides<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = text("KORREL8R_URL") {
            self.backends.korrel8r_url = v;
        }
        if let Some(v) = text("PROMETHEUS_URL") {
            self.backends.prometheus_url = v;
        }
        if let Some(v) = text("TEMPO_URL") {
            self.backends.tempo_url = v;
        }
        if let Some(v) = text("PROMETHEUS_TOKEN") {
            self.backends.bearer_token = Some(v);
        }
        if let Some(v) = text("BACKEND_TIMEOUT") {
            self.backends.timeout_secs = parse_number("BACKEND_TIMEOUT", &v)?;
        }
        if let Some(v) = text("LLM_ENDPOINT") {
            self.llm.endpoint = v;
        }
        if let Some(v) = text("LLM_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = text("LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_number("LLM_MAX_TOKENS", &v)?;
        }
        if let Some(v) = text("LLM_TIMEOUT") {
            self.llm.timeout_secs = parse_number("LLM_TIMEOUT", &v)?;
        }
        if let Some(v) = text("LLM_API_TOKEN") {
            self.llm.api_key = Some(v);
        }
        Ok(())
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backends.timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> anyhow::Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a number, got '{}'", key, value))
}
