//! Audit record types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sightline_core::{AnalysisResult, EvidenceBundle, EvidencePayload, ResultOrigin, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    Category,
    Correlation,
    Incident,
}

/// One produced result, as written to the audit trail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub kind: AuditKind,
    pub subject: String,
    pub structured: bool,
    #[serde(default)]
    pub origin: Option<ResultOrigin>,
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub correlation_count: usize,
    /// Failures that were absorbed into the result instead of surfaced
    #[serde(default)]
    pub absorbed_errors: Vec<String>,
    /// Raw LLM text, only kept for degraded results
    #[serde(default)]
    pub raw_response: Option<String>,
}

impl AuditRecord {
    pub fn from_analysis(
        kind: AuditKind,
        subject: &str,
        result: &AnalysisResult,
        evidence: &EvidenceBundle,
    ) -> Self {
        let mut absorbed_errors = failure_reasons(evidence);
        absorbed_errors.extend(result.llm_error.iter().cloned());
        absorbed_errors.extend(result.parse_error.iter().cloned());

        Self {
            timestamp: Utc::now(),
            kind,
            subject: subject.to_string(),
            structured: result.structured,
            origin: Some(result.origin),
            severity: Some(result.severity),
            correlation_count: evidence.correlation_count(),
            absorbed_errors,
            raw_response: if result.structured {
                None
            } else {
                result.analysis.clone()
            },
        }
    }

    /// Record for a correlation lookup that produced no LLM analysis
    pub fn from_correlation(subject: &str, evidence: &EvidenceBundle) -> Self {
        Self {
            timestamp: Utc::now(),
            kind: AuditKind::Correlation,
            subject: subject.to_string(),
            structured: true,
            origin: None,
            severity: None,
            correlation_count: evidence.correlation_count(),
            absorbed_errors: failure_reasons(evidence),
            raw_response: None,
        }
    }

    /// Record for a request that aborted, e.g. a failed graph query
    pub fn from_error(kind: AuditKind, subject: &str, error: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
            subject: subject.to_string(),
            structured: false,
            origin: None,
            severity: None,
            correlation_count: 0,
            absorbed_errors: vec![error.to_string()],
            raw_response: None,
        }
    }
}

fn failure_reasons(evidence: &EvidenceBundle) -> Vec<String> {
    evidence
        .failures()
        .filter_map(|e| match &e.payload {
            EvidencePayload::Failed { reason } => Some(reason.clone()),
            _ => None,
        })
        .collect()
}
