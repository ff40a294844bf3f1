//! Signal selectors and correlation edges

use crate::error::InputError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of observability signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Metric,
    Trace,
}

impl SignalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignalKind::Metric => "metric",
            SignalKind::Trace => "trace",
        }
    }

    pub fn complement(&self) -> SignalKind {
        match self {
            SignalKind::Metric => SignalKind::Trace,
            SignalKind::Trace => SignalKind::Metric,
        }
    }
}

/// Starting point handed to the correlation graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignalSelector {
    Metric { query: String },
    Trace { trace_id: String },
}

impl SignalSelector {
    pub fn metric(query: &str) -> Self {
        SignalSelector::Metric {
            query: query.to_string(),
        }
    }

    pub fn trace(trace_id: &str) -> Self {
        SignalSelector::Trace {
            trace_id: trace_id.to_string(),
        }
    }

    /// Trace selector from user input; ids are 1 to 32 hex digits
    pub fn parse_trace(trace_id: &str) -> Result<Self, InputError> {
        let trace_id = trace_id.trim();
        let valid = !trace_id.is_empty()
            && trace_id.len() <= 32
            && trace_id.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(InputError::InvalidTraceId(trace_id.to_string()));
        }
        Ok(Self::trace(trace_id))
    }

    pub fn kind(&self) -> SignalKind {
        match self {
            SignalSelector::Metric { .. } => SignalKind::Metric,
            SignalSelector::Trace { .. } => SignalKind::Trace,
        }
    }

    /// The complementary kind the graph should walk towards
    pub fn goal(&self) -> SignalKind {
        self.kind().complement()
    }

    /// Domain class understood by the correlation graph
    pub fn class(&self) -> &'static str {
        match self {
            SignalSelector::Metric { .. } => "metric:prometheus",
            SignalSelector::Trace { .. } => "trace:span",
        }
    }

    /// Query string in the graph's `domain:selector` form
    pub fn to_query(&self) -> String {
        match self {
            SignalSelector::Metric { query } => format!("metric:{}", query),
            SignalSelector::Trace { trace_id } => format!(
                "trace:{{.trace_id=\"{}\"}}",
                trace_id.replace('\\', "\\\\").replace('"', "\\\"")
            ),
        }
    }

    /// The metric query or trace id this selector starts from
    pub fn subject(&self) -> &str {
        match self {
            SignalSelector::Metric { query } => query,
            SignalSelector::Trace { trace_id } => trace_id,
        }
    }
}

/// Search bounds for one graph query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    pub limit: usize,
    pub timeout: String,
}

impl Default for Constraint {
    fn default() -> Self {
        Self {
            limit: 100,
            timeout: "30s".to_string(),
        }
    }
}

/// Related signal discovered by the graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CorrelationTarget {
    Metric { metric_name: String },
    Trace { trace_id: String },
}

impl CorrelationTarget {
    pub fn kind(&self) -> SignalKind {
        match self {
            CorrelationTarget::Metric { .. } => SignalKind::Metric,
            CorrelationTarget::Trace { .. } => SignalKind::Trace,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            CorrelationTarget::Metric { metric_name } => metric_name,
            CorrelationTarget::Trace { trace_id } => trace_id,
        }
    }
}

impl fmt::Display for CorrelationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind().as_str(), self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationEdge {
    pub rule: String,
    pub service_name: String,
    pub target: CorrelationTarget,
}

/// Deduplicated set of edges returned by one graph query.
///
/// Edges keep the order in which the graph first returned them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationResult {
    results: Vec<CorrelationEdge>,
    count: usize,
}

impl CorrelationResult {
    pub fn from_edges(edges: impl IntoIterator<Item = CorrelationEdge>) -> Self {
        let mut seen = HashSet::new();
        let results: Vec<CorrelationEdge> = edges
            .into_iter()
            .filter(|e| seen.insert((e.rule.clone(), e.target.clone())))
            .collect();
        let count = results.len();
        Self { results, count }
    }

    pub fn edges(&self) -> &[CorrelationEdge] {
        &self.results
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edge(rule: &str, trace_id: &str) -> CorrelationEdge {
        CorrelationEdge {
            rule: rule.to_string(),
            service_name: "checkout".to_string(),
            target: CorrelationTarget::Trace {
                trace_id: trace_id.to_string(),
            },
        }
    }

    #[test]
    fn test_selector_queries() {
        assert_eq!(
            SignalSelector::metric("cpu_usage_percent").to_query(),
            "metric:cpu_usage_percent"
        );
        assert_eq!(
            SignalSelector::trace("abc").to_query(),
            r#"trace:{.trace_id="abc"}"#
        );
        assert_eq!(SignalSelector::metric("x").goal(), SignalKind::Trace);
        assert_eq!(SignalSelector::trace("x").goal(), SignalKind::Metric);
    }

    #[test]
    fn test_trace_selector_quotes_escaped() {
        assert_eq!(
            SignalSelector::trace(r#"a"b"#).to_query(),
            r#"trace:{.trace_id="a\"b"}"#
        );
    }

    #[test]
    fn test_parse_trace_accepts_hex_only() {
        assert_eq!(
            SignalSelector::parse_trace(" 4bf92f3577b34da6a3ce929d0e0e4736 ").unwrap(),
            SignalSelector::trace("4bf92f3577b34da6a3ce929d0e0e4736")
        );
        let too_long = "a".repeat(33);
        for bad in ["", "abc/def", "abc?x=1", r#"a"b"#, too_long.as_str()] {
            assert!(
                matches!(SignalSelector::parse_trace(bad), Err(InputError::InvalidTraceId(_))),
                "id {:?}",
                bad
            );
        }
    }

    #[test]
    fn test_result_dedupes_by_rule_and_target() {
        let result = CorrelationResult::from_edges(vec![
            edge("MetricToTrace", "t1"),
            edge("MetricToTrace", "t2"),
            edge("MetricToTrace", "t1"),
            edge("AlertToTrace", "t1"),
        ]);
        assert_eq!(result.count(), 3);
        let ids: Vec<_> = result.edges().iter().map(|e| e.target.id()).collect();
        assert_eq!(ids, vec!["t1", "t2", "t1"]);
    }

    #[test]
    fn test_result_serializes_count() {
        let result = CorrelationResult::from_edges(vec![edge("r", "t1")]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["count"], 1);
        assert_eq!(json["results"][0]["target"]["trace_id"], "t1");
    }
}
