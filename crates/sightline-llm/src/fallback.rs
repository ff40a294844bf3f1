//! Rule-based analysis used when the LLM cannot be reached

use crate::error::LlmError;
use sightline_core::{AnalysisResult, EvidenceBundle, ResultOrigin, Severity};

/// `(trigger words, finding, recommendation)`
const KEYWORD_RULES: &[(&[&str], &str, &str)] = &[
    (
        &["cpu"],
        "High CPU utilization detected",
        "Consider scaling horizontally or optimizing CPU-intensive operations",
    ),
    (
        &["memory"],
        "Memory pressure identified",
        "Check for memory leaks or increase memory allocation",
    ),
    (
        &["latency", "slow"],
        "Performance degradation observed",
        "Investigate bottlenecks in critical path",
    ),
];

const DEFAULT_RECOMMENDATIONS: &[&str] = &[
    "Investigate high-correlation services first",
    "Check recent deployments or changes",
    "Monitor key metrics for anomalies",
];

/// Deterministic result from keyword presence in `text` and the evidence.
pub fn fallback_analysis(
    evidence: &EvidenceBundle,
    text: &str,
    severity: Severity,
    error: &LlmError,
) -> AnalysisResult {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect();

    let mut findings = Vec::new();
    let mut recommendations = Vec::new();
    for (triggers, finding, recommendation) in KEYWORD_RULES {
        if triggers.iter().any(|t| words.iter().any(|w| w == t)) {
            findings.push(finding.to_string());
            recommendations.push(recommendation.to_string());
        }
    }

    let count = evidence.correlation_count();
    let root_cause = if findings.is_empty() {
        format!("Multiple correlation patterns detected ({} correlations)", count)
    } else {
        findings.join("; ")
    };
    if recommendations.is_empty() {
        recommendations = DEFAULT_RECOMMENDATIONS.iter().map(|s| s.to_string()).collect();
    }

    let failed = evidence.failures().count();
    let impact = if failed > 0 {
        format!(
            "Potential service impact based on correlation count; {} of {} lookups failed",
            failed,
            evidence.len()
        )
    } else {
        "Potential service impact based on correlation count".to_string()
    };

    let summary = format!(
        "Fallback analysis (LLM unavailable: {}). {}. Recommended: {}.",
        error,
        root_cause,
        recommendations.join("; ")
    );

    AnalysisResult {
        root_cause,
        impact,
        recommendations,
        severity,
        structured: true,
        origin: ResultOrigin::Fallback,
        timeline_analysis: None,
        promql: None,
        summary: Some(summary),
        analysis: None,
        parse_error: None,
        llm_error: Some(error.to_string()),
    }
}
