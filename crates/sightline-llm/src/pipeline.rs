//! Evidence in, analysis out

use crate::client::{HttpLlmClient, LlmClient};
use crate::fallback::fallback_analysis;
use crate::parse::parse_response;
use crate::prompt::{build_prompt, ResponseSchema};
use sightline_core::{inject_namespace, AnalysisResult, EvidenceBundle, LlmConfig, Severity};
use sightline_telemetry::estimate_tokens;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// What the caller wants summarized, beyond the evidence itself
#[derive(Debug, Clone)]
pub struct SummaryRequest {
    /// Rendered into the preamble, e.g. "OpenShift Fleet Overview metrics for Cluster Wide"
    pub subject: String,
    /// Selects the two-key answer schema when present
    pub question: Option<String>,
    /// Set for namespace-scoped requests; returned PromQL is constrained to it
    pub namespace: Option<String>,
    /// Used when the reply has no usable severity, and for the fallback
    pub severity_hint: Severity,
}

impl SummaryRequest {
    pub fn incident(subject: &str, severity_hint: Severity) -> Self {
        Self {
            subject: subject.to_string(),
            question: None,
            namespace: None,
            severity_hint,
        }
    }
}

#[derive(Clone)]
pub struct PromptPipeline {
    client: Arc<dyn LlmClient>,
    token_budget: usize,
}

impl PromptPipeline {
    pub fn new(client: Arc<dyn LlmClient>, token_budget: usize) -> Self {
        Self {
            client,
            token_budget,
        }
    }

    pub fn from_config(config: &LlmConfig) -> Self {
        Self::new(
            Arc::new(HttpLlmClient::new(config.clone())),
            config.prompt_token_budget,
        )
    }

    /// Always returns a result: LLM failures become a fallback analysis and
    /// undecodable replies a degraded one.
    pub async fn summarize(&self, evidence: &EvidenceBundle, request: &SummaryRequest) -> AnalysisResult {
        let schema = ResponseSchema::for_question(request.question.as_deref());
        let prompt = build_prompt(evidence, request, self.token_budget);
        debug!(
            "Prompt for {} ~{} tokens, {} evidence entries",
            request.subject,
            estimate_tokens(&prompt),
            evidence.len()
        );

        let raw = match self.client.complete(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!("LLM call failed, using rule-based analysis: {}", e);
                let text = request
                    .question
                    .as_deref()
                    .or(evidence.description.as_deref())
                    .unwrap_or_default();
                return fallback_analysis(evidence, text, request.severity_hint, &e);
            }
        };

        let mut result = parse_response(&raw, schema, request.severity_hint);
        if let Some(reason) = &result.parse_error {
            warn!("LLM reply kept unstructured: {}", reason);
        } else {
            info!("LLM analysis parsed ({:?} schema)", schema);
        }

        if let (Some(namespace), Some(promql)) = (&request.namespace, &result.promql) {
            result.promql = Some(inject_namespace(promql, namespace));
        }
        result
    }
}

impl std::fmt::Debug for PromptPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptPipeline")
            .field("token_budget", &self.token_budget)
            .finish_non_exhaustive()
    }
}
