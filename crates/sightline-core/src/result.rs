//! Structured analysis result

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Severity implied by the number of correlation edges found
    pub fn from_correlation_count(count: usize) -> Self {
        if count > 10 {
            Severity::High
        } else if count > 5 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Severity::Low),
            "medium" | "moderate" => Some(Severity::Medium),
            "high" => Some(Severity::High),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Which path produced a result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultOrigin {
    Llm,
    Fallback,
    NoData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub root_cause: String,
    pub impact: String,
    pub recommendations: Vec<String>,
    pub severity: Severity,
    /// False when the LLM reply could not be decoded into the schema
    pub structured: bool,
    pub origin: ResultOrigin,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promql: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Raw LLM text, kept for audit when `structured` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_error: Option<String>,
}

impl AnalysisResult {
    /// Result for an LLM reply that did not decode; the raw text is preserved
    pub fn degraded(raw: &str, parse_error: impl Into<String>, severity: Severity) -> Self {
        Self {
            root_cause: "Unknown".to_string(),
            impact: "Unknown".to_string(),
            recommendations: Vec::new(),
            severity,
            structured: false,
            origin: ResultOrigin::Llm,
            timeline_analysis: None,
            promql: None,
            summary: None,
            analysis: Some(raw.to_string()),
            parse_error: Some(parse_error.into()),
            llm_error: None,
        }
    }

    /// Result for a request whose backends returned no data; the LLM is skipped
    pub fn no_data(summary: &str) -> Self {
        Self {
            root_cause: "Unknown".to_string(),
            impact: "Unknown".to_string(),
            recommendations: Vec::new(),
            severity: Severity::Low,
            structured: true,
            origin: ResultOrigin::NoData,
            timeline_analysis: None,
            promql: None,
            summary: Some(summary.to_string()),
            analysis: None,
            parse_error: None,
            llm_error: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !self.structured
    }
}
