//! Evidence gathered for one analysis request

use crate::signal::CorrelationEdge;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One labelled time series; points are `(epoch_seconds, value)`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub labels: BTreeMap<String, String>,
    pub points: Vec<(i64, f64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    pub latest: f64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub points: usize,
}

/// Range-query result for one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricData {
    pub query: String,
    pub series: Vec<Series>,
}

impl MetricData {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.points.is_empty())
    }

    /// Summary over all points; `latest` is the newest point of any series
    pub fn stats(&self) -> Option<SeriesStats> {
        let mut points = self.series.iter().flat_map(|s| s.points.iter()).peekable();
        points.peek()?;

        let mut latest = (i64::MIN, 0.0);
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        let mut count = 0usize;
        for &(ts, value) in points {
            if !value.is_finite() {
                continue;
            }
            if ts >= latest.0 {
                latest = (ts, value);
            }
            min = min.min(value);
            max = max.max(value);
            sum += value;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        Some(SeriesStats {
            latest: latest.1,
            min,
            max,
            avg: sum / count as f64,
            points: count,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceSummary {
    pub trace_id: String,
    pub root_service: Option<String>,
    pub root_name: Option<String>,
    pub services: Vec<String>,
    pub span_count: usize,
    pub duration_ms: f64,
    pub start_ts: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EvidencePayload {
    Metric(MetricData),
    Trace(TraceSummary),
    TraceList { traces: Vec<TraceSummary> },
    /// The lookup succeeded but returned nothing
    Empty { note: String },
    /// The lookup itself failed
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceEntry {
    pub label: String,
    #[serde(flatten)]
    pub payload: EvidencePayload,
}

impl EvidenceEntry {
    pub fn new(label: impl Into<String>, payload: EvidencePayload) -> Self {
        Self {
            label: label.into(),
            payload,
        }
    }

    pub fn empty(label: impl Into<String>, note: impl Into<String>) -> Self {
        Self::new(label, EvidencePayload::Empty { note: note.into() })
    }

    /// Failure marker naming the target that could not be fetched
    pub fn failed(label: impl Into<String>, target: &str, reason: impl std::fmt::Display) -> Self {
        Self::new(
            label,
            EvidencePayload::Failed {
                reason: format!("fetch failed for target {}: {}", target, reason),
            },
        )
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.payload, EvidencePayload::Failed { .. })
    }

    pub fn has_data(&self) -> bool {
        match &self.payload {
            EvidencePayload::Metric(data) => !data.is_empty(),
            EvidencePayload::Trace(_) => true,
            EvidencePayload::TraceList { traces } => !traces.is_empty(),
            EvidencePayload::Empty { .. } | EvidencePayload::Failed { .. } => false,
        }
    }
}

/// Aggregated input to the LLM for one request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidenceBundle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub entries: Vec<EvidenceEntry>,
    pub correlations: Vec<CorrelationEdge>,
}

impl EvidenceBundle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn push(&mut self, entry: EvidenceEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn has_data(&self) -> bool {
        self.entries.iter().any(EvidenceEntry::has_data)
    }

    pub fn failures(&self) -> impl Iterator<Item = &EvidenceEntry> {
        self.entries.iter().filter(|e| e.is_failed())
    }

    pub fn correlation_count(&self) -> usize {
        self.correlations.len()
    }

    /// Services named by the correlation edges, sorted
    pub fn correlated_services(&self) -> BTreeSet<&str> {
        self.correlations
            .iter()
            .map(|e| e.service_name.as_str())
            .collect()
    }

    /// Edge count per correlation rule
    pub fn rule_counts(&self) -> BTreeMap<&str, usize> {
        let mut counts = BTreeMap::new();
        for edge in &self.correlations {
            *counts.entry(edge.rule.as_str()).or_default() += 1;
        }
        counts
    }

    /// Append another bundle's entries and edges, keeping this description
    pub fn merge(&mut self, other: EvidenceBundle) {
        self.entries.extend(other.entries);
        self.correlations.extend(other.correlations);
        if self.description.is_none() {
            self.description = other.description;
        }
    }
}
