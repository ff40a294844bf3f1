//! Incident analysis over keyword checks

use crate::keywords::{check_metrics, extract_keywords, Check};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use sightline_core::{AnalysisResult, EvidenceBundle, Severity, TimeWindow};
use sightline_correlate::{CorrelationOrchestrator, CorrelationOutcome};
use sightline_llm::{PromptPipeline, SummaryRequest};
use tracing::{info, warn};

/// What one check correlation produced
#[derive(Debug, Clone, Serialize)]
pub struct CheckRun {
    #[serde(flatten)]
    pub check: Check,
    pub correlation_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct IncidentReport {
    pub incident_description: String,
    pub extracted_keywords: Vec<String>,
    pub checks: Vec<CheckRun>,
    pub total_correlations: usize,
    /// Severity implied by the correlation count
    pub severity: Severity,
    pub analysis: AnalysisResult,
    pub start_ts: i64,
    pub end_ts: i64,
    pub analysis_timestamp: DateTime<Utc>,
    #[serde(skip)]
    pub evidence: EvidenceBundle,
}

pub struct IncidentAnalyzer {
    orchestrator: CorrelationOrchestrator,
    pipeline: PromptPipeline,
}

impl IncidentAnalyzer {
    pub fn new(orchestrator: CorrelationOrchestrator, pipeline: PromptPipeline) -> Self {
        Self {
            orchestrator,
            pipeline,
        }
    }

    pub async fn analyze(&self, description: &str, window: TimeWindow) -> IncidentReport {
        let keywords = extract_keywords(description);
        let checks = check_metrics(&keywords);
        info!(
            "Incident keywords {:?}, {} check correlations",
            keywords,
            checks.len()
        );

        let outcomes = join_all(
            checks
                .iter()
                .map(|p| self.orchestrator.metric_to_traces(p.metric, window)),
        )
        .await;

        let mut evidence = EvidenceBundle::new().with_description(description);
        let mut runs = Vec::with_capacity(checks.len());
        let mut total = 0;
        for (check, outcome) in checks.iter().zip(outcomes) {
            match outcome {
                CorrelationOutcome::Aggregated(report) => {
                    let count = report.correlations.count();
                    total += count;
                    evidence.push(report.origin);
                    evidence.merge(report.evidence);
                    runs.push(CheckRun {
                        check: *check,
                        correlation_count: count,
                        error: None,
                    });
                }
                CorrelationOutcome::Errored { error, reason } => {
                    warn!("Check {} dropped: {} ({})", check.metric, error, reason);
                    runs.push(CheckRun {
                        check: *check,
                        correlation_count: 0,
                        error: Some(format!("{}: {}", error, reason)),
                    });
                }
            }
        }

        let severity = Severity::from_correlation_count(total);
        let request = SummaryRequest::incident("observability data for a reported incident", severity);
        let analysis = self.pipeline.summarize(&evidence, &request).await;

        IncidentReport {
            incident_description: description.to_string(),
            extracted_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            checks: runs,
            total_correlations: total,
            severity,
            analysis,
            start_ts: window.start_ts(),
            end_ts: window.end_ts(),
            analysis_timestamp: Utc::now(),
            evidence,
        }
    }
}
