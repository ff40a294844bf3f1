//! Category/scope metrics analysis and chat

use crate::decode::decode_matrix;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use sightline_core::{
    AnalysisResult, EvidenceBundle, EvidenceEntry, EvidencePayload, InputError, MetricCategory,
    NamedQuery, ScopeCatalog, Scope, Severity, TimeWindow,
};
use sightline_gateway::{BackendRequest, Gateways};
use sightline_llm::{PromptPipeline, SummaryRequest};
use tracing::{info, warn};

pub const NO_DATA_SUMMARY: &str = "No metric data found for the selected category/scope in the time window. \
     Try a broader window (e.g., last 6h) or a different category.";

#[derive(Debug, Clone)]
pub struct CategoryRequest {
    pub category: MetricCategory,
    pub scope: Scope,
    pub window: TimeWindow,
    /// Chat mode when present
    pub question: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub metric_category: String,
    pub scope: String,
    pub namespace: String,
    pub start_ts: i64,
    pub end_ts: i64,
    /// The namespace request was served from the cluster-wide query set
    pub degraded_scope: bool,
    pub promql: String,
    pub summary: String,
    pub analysis: AnalysisResult,
    pub analysis_timestamp: DateTime<Utc>,
    /// Queries whose lookup failed, with the failure reason
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed_lookups: Vec<EvidenceEntry>,
    #[serde(skip)]
    pub evidence: EvidenceBundle,
}

pub struct CategoryAnalyzer {
    gateways: Gateways,
    catalog: ScopeCatalog,
    pipeline: PromptPipeline,
}

impl CategoryAnalyzer {
    pub fn new(gateways: Gateways, pipeline: PromptPipeline) -> Self {
        Self {
            gateways,
            catalog: ScopeCatalog::standard(),
            pipeline,
        }
    }

    /// Fetch every query of the category concurrently and summarize.
    ///
    /// Unknown categories fail before any network call. When no query
    /// returns data the LLM is skipped.
    pub async fn analyze(&self, request: &CategoryRequest) -> Result<CategoryReport, InputError> {
        let mut queries = self.catalog.lookup(&request.category, &request.scope)?;
        if let Some(namespace) = request.scope.namespace() {
            queries = queries.with_namespace(namespace);
        }
        if queries.degraded_scope {
            warn!(
                "No namespace-specific queries for '{}', using the cluster-wide set",
                request.category
            );
        }
        info!(
            "Analyzing {} for {} ({} queries)",
            request.category,
            request.scope,
            queries.len()
        );

        let fetches = queries
            .entries
            .iter()
            .map(|q| self.fetch_query(q, request.window));
        let mut evidence = EvidenceBundle::new();
        for entry in join_all(fetches).await {
            evidence.push(entry);
        }

        let analysis = if evidence.has_data() {
            let subject = format!(
                "OpenShift {} metrics for {}",
                request.category,
                request.scope.describe()
            );
            let summary_request = SummaryRequest {
                subject,
                question: request.question.clone(),
                namespace: request.scope.namespace().map(str::to_string),
                severity_hint: Severity::default(),
            };
            self.pipeline.summarize(&evidence, &summary_request).await
        } else {
            info!("No metric data for {}, skipping LLM", request.category);
            AnalysisResult::no_data(&no_data_summary(&evidence))
        };
        let failed_lookups: Vec<EvidenceEntry> = evidence.failures().cloned().collect();

        Ok(CategoryReport {
            metric_category: request.category.to_string(),
            scope: request.scope.as_str().to_string(),
            namespace: request.scope.namespace().unwrap_or_default().to_string(),
            start_ts: request.window.start_ts(),
            end_ts: request.window.end_ts(),
            degraded_scope: queries.degraded_scope,
            promql: analysis.promql.clone().unwrap_or_default(),
            summary: summary_text(&analysis),
            analysis,
            analysis_timestamp: Utc::now(),
            failed_lookups,
            evidence,
        })
    }

    pub fn catalog(&self) -> &ScopeCatalog {
        &self.catalog
    }

    async fn fetch_query(&self, query: &NamedQuery, window: TimeWindow) -> EvidenceEntry {
        let result = self
            .gateways
            .metrics
            .call(BackendRequest::range_query(&query.query, window), self.gateways.timeout)
            .await
            .and_then(|r| decode_matrix(&query.query, &r.body));
        match result {
            Ok(data) if data.is_empty() => EvidenceEntry::empty(&query.label, "no series in window"),
            Ok(data) => EvidenceEntry::new(&query.label, EvidencePayload::Metric(data)),
            Err(e) => {
                warn!("Query '{}' failed: {}", query.label, e);
                EvidenceEntry::failed(&query.label, &query.query, e)
            }
        }
    }
}

/// One-paragraph text for the `summary` field
/// Empty windows and failed lookups read differently
fn no_data_summary(evidence: &EvidenceBundle) -> String {
    let failed = evidence.failures().count();
    if failed == 0 {
        return NO_DATA_SUMMARY.to_string();
    }
    format!(
        "{} of {} metric lookups failed; the remaining queries returned no data in the time window.",
        failed,
        evidence.len()
    )
}

fn summary_text(analysis: &AnalysisResult) -> String {
    if let Some(summary) = &analysis.summary {
        return summary.clone();
    }
    if let Some(raw) = &analysis.analysis {
        return raw.trim().to_string();
    }
    let mut text = format!("Root cause: {}. Impact: {}.", analysis.root_cause, analysis.impact);
    if !analysis.recommendations.is_empty() {
        text.push_str(" Recommendations: ");
        text.push_str(&analysis.recommendations.join("; "));
        text.push('.');
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use sightline_core::ResultOrigin;
    use sightline_gateway::{BackendError, FakeBackend, FakeReply};
    use sightline_llm::FakeLlmClient;
    use std::sync::Arc;
    use std::time::Duration;

    fn analyzer(metrics: FakeBackend, llm: FakeLlmClient) -> (CategoryAnalyzer, Arc<FakeBackend>, Arc<FakeLlmClient>) {
        let metrics = Arc::new(metrics);
        let llm = Arc::new(llm);
        let gateways = Gateways::new(
            Arc::new(FakeBackend::new("graph")),
            metrics.clone(),
            Arc::new(FakeBackend::new("traces")),
            Duration::from_secs(30),
        );
        (
            CategoryAnalyzer::new(gateways, PromptPipeline::new(llm.clone(), 6000)),
            metrics,
            llm,
        )
    }

    fn request(category: &str, scope: Scope, question: Option<&str>) -> CategoryRequest {
        CategoryRequest {
            category: MetricCategory::new(category),
            scope,
            window: TimeWindow::new(1_700_000_000, 1_700_003_600).unwrap(),
            question: question.map(str::to_string),
        }
    }

    fn series() -> serde_json::Value {
        json!({"status": "success", "data": {"result": [{"metric": {}, "values": [[1700000000, "4"]]}]}})
    }

    #[tokio::test]
    async fn test_unknown_category_makes_no_calls() {
        let (analyzer, metrics, llm) = analyzer(FakeBackend::new("metrics"), FakeLlmClient::new());
        let err = analyzer
            .analyze(&request("Quantum Flux", Scope::ClusterWide, None))
            .await
            .unwrap_err();
        assert!(matches!(err, InputError::UnknownCategory { .. }));
        assert_eq!(metrics.call_count(), 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_data_skips_llm() {
        let (analyzer, metrics, llm) = analyzer(FakeBackend::new("metrics"), FakeLlmClient::new());
        let report = analyzer
            .analyze(&request("Fleet Overview", Scope::ClusterWide, None))
            .await
            .unwrap();
        assert_eq!(report.summary, NO_DATA_SUMMARY);
        assert_eq!(report.analysis.origin, ResultOrigin::NoData);
        assert!(serde_json::to_value(&report).unwrap().get("failed_lookups").is_none());
        assert_eq!(metrics.call_count(), 6);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chat_with_namespace() {
        let metrics = FakeBackend::new("metrics").fallback(FakeReply::ok(series()));
        let llm = FakeLlmClient::new()
            .reply(r#"Sure! {"promql": "sum(kube_pod_info)", "summary": "12 pods running"}"#);
        let (analyzer, metrics, _) = analyzer(metrics, llm);

        let scope = Scope::namespaced("team-a").unwrap();
        let report = analyzer
            .analyze(&request("Workloads & Pods", scope, Some("How many pods?")))
            .await
            .unwrap();
        assert_eq!(report.scope, "namespace_scoped");
        assert_eq!(report.namespace, "team-a");
        assert!(!report.degraded_scope);
        assert_eq!(report.promql, r#"sum(kube_pod_info{namespace="team-a"})"#);
        assert_eq!(report.summary, "12 pods running");
        assert!(metrics
            .calls()
            .iter()
            .all(|key| key.contains(r#"namespace="team-a""#)));
    }

    #[tokio::test]
    async fn test_cluster_only_category_flags_degraded_scope() {
        let metrics = FakeBackend::new("metrics").fallback(FakeReply::ok(series()));
        let llm = FakeLlmClient::new().reply(r#"{"root_cause": "none", "impact": "none"}"#);
        let (analyzer, _, _) = analyzer(metrics, llm);

        let report = analyzer
            .analyze(&request("Fleet Overview", Scope::namespaced("team-a").unwrap(), None))
            .await
            .unwrap();
        assert!(report.degraded_scope);
        assert_eq!(report.summary, "Root cause: none. Impact: none.");
    }

    #[tokio::test]
    async fn test_failed_queries_are_marked() {
        let metrics = FakeBackend::new("metrics").fallback(FakeReply::error(BackendError::HttpStatus(500)));
        let (analyzer, _, llm) = analyzer(metrics, FakeLlmClient::new());
        let report = analyzer
            .analyze(&request("Fleet Overview", Scope::ClusterWide, None))
            .await
            .unwrap();
        assert_eq!(report.evidence.failures().count(), 6);
        assert_eq!(report.analysis.origin, ResultOrigin::NoData);
        assert_eq!(llm.call_count(), 0);
        assert_ne!(report.summary, NO_DATA_SUMMARY);
        assert!(report.summary.starts_with("6 of 6 metric lookups failed"));

        let json = serde_json::to_value(&report).unwrap();
        let failed = json["failed_lookups"].as_array().unwrap();
        assert_eq!(failed.len(), 6);
        assert_eq!(failed[0]["status"], "failed");
        assert!(failed[0]["reason"].as_str().unwrap().contains("HTTP 500"));
    }
}
