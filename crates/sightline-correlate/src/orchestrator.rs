//! Graph query, ordered concurrent fan-out, aggregation

use crate::decode::{decode_edges, decode_matrix, decode_search, decode_trace};
use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use sightline_core::{
    Constraint, CorrelationConfig, CorrelationResult, CorrelationTarget, EvidenceBundle,
    EvidenceEntry, EvidencePayload, SignalKind, SignalSelector, TimeWindow, TraceSummary,
};
use sightline_gateway::{BackendError, BackendRequest, Gateways};
use tracing::{info, warn};

pub const NO_CORRELATIONS: &str = "No correlations found";

/// Lifecycle of one correlation request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationState {
    Idle,
    GraphQueried,
    SignalsFetched,
    Aggregated,
    Errored,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorrelationReport {
    pub start: SignalSelector,
    pub goal: SignalKind,
    pub start_ts: i64,
    pub end_ts: i64,
    pub correlations: CorrelationResult,
    /// The starting signal's own data, outside the edge-ordered list
    pub origin: EvidenceEntry,
    /// One entry per edge, in graph order
    pub evidence: EvidenceBundle,
    pub analysis_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum CorrelationOutcome {
    Aggregated(Box<CorrelationReport>),
    /// The graph query failed; nothing else was fetched
    Errored { error: String, reason: String },
}

impl CorrelationOutcome {
    pub fn state(&self) -> CorrelationState {
        match self {
            CorrelationOutcome::Aggregated(_) => CorrelationState::Aggregated,
            CorrelationOutcome::Errored { .. } => CorrelationState::Errored,
        }
    }

    pub fn report(&self) -> Option<&CorrelationReport> {
        match self {
            CorrelationOutcome::Aggregated(report) => Some(report),
            CorrelationOutcome::Errored { .. } => None,
        }
    }

    pub fn into_report(self) -> Option<CorrelationReport> {
        match self {
            CorrelationOutcome::Aggregated(report) => Some(*report),
            CorrelationOutcome::Errored { .. } => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CorrelationOrchestrator {
    gateways: Gateways,
    constraint: Constraint,
    max_search_traces: usize,
}

impl CorrelationOrchestrator {
    pub fn new(gateways: Gateways, config: &CorrelationConfig) -> Self {
        Self {
            gateways,
            constraint: config.constraint(),
            max_search_traces: config.max_search_traces,
        }
    }

    pub async fn metric_to_traces(&self, query: &str, window: TimeWindow) -> CorrelationOutcome {
        self.correlate(SignalSelector::metric(query), window).await
    }

    pub async fn trace_to_metrics(&self, trace_id: &str, window: TimeWindow) -> CorrelationOutcome {
        self.correlate(SignalSelector::trace(trace_id), window).await
    }

    /// Walk the graph from `start` to the complementary signal kind and fetch
    /// every related signal concurrently.
    ///
    /// Only a failed graph query is fatal. Per-edge failures become
    /// `Failed` entries in the same position as their edge.
    pub async fn correlate(&self, start: SignalSelector, window: TimeWindow) -> CorrelationOutcome {
        let goal = start.goal();
        let subject = start.to_query();
        info!("[{:?}] correlating {} -> {}", CorrelationState::Idle, subject, goal.as_str());

        let request = BackendRequest::GraphGoals {
            goal,
            selector: start.clone(),
            constraint: self.constraint.clone(),
        };
        let edges = match self
            .gateways
            .graph
            .call(request, self.gateways.timeout)
            .await
            .and_then(|response| decode_edges(&response.body))
        {
            Ok(edges) => edges,
            Err(e) => {
                warn!("[{:?}] graph query for {} failed: {}", CorrelationState::Errored, subject, e);
                return CorrelationOutcome::Errored {
                    error: NO_CORRELATIONS.to_string(),
                    reason: e.to_string(),
                };
            }
        };
        let correlations = CorrelationResult::from_edges(edges);
        info!(
            "[{:?}] {} edges for {}",
            CorrelationState::GraphQueried,
            correlations.count(),
            subject
        );

        let fetches = correlations
            .edges()
            .iter()
            .map(|edge| self.fetch_target(&edge.target, window));
        let (origin, entries) = futures::join!(self.fetch_origin(&start, window), join_all(fetches));
        info!(
            "[{:?}] {} fetched, {} failed",
            CorrelationState::SignalsFetched,
            entries.len(),
            entries.iter().filter(|e| e.is_failed()).count()
        );

        let mut evidence = EvidenceBundle::new();
        if correlations.is_empty() {
            evidence.push(EvidenceEntry::empty(
                "correlations",
                format!("graph returned no related {} signals", goal.as_str()),
            ));
        }
        for entry in entries {
            evidence.push(entry);
        }
        evidence.correlations = correlations.edges().to_vec();

        info!("[{:?}] {}", CorrelationState::Aggregated, subject);
        CorrelationOutcome::Aggregated(Box::new(CorrelationReport {
            start,
            goal,
            start_ts: window.start_ts(),
            end_ts: window.end_ts(),
            correlations,
            origin,
            evidence,
            analysis_timestamp: Utc::now(),
        }))
    }

    /// Traces of one service, newest first as returned by the trace store
    pub async fn search_traces(
        &self,
        service: &str,
        window: TimeWindow,
    ) -> Result<Vec<TraceSummary>, BackendError> {
        let request = BackendRequest::TraceSearch {
            service: service.to_string(),
            limit: self.max_search_traces,
            window,
        };
        let response = self.gateways.traces.call(request, self.gateways.timeout).await?;
        decode_search(&response.body)
    }

    /// Recent traces of every service named by the correlation edges, one
    /// entry per service. A failed search becomes a `Failed` entry.
    pub async fn service_traces(
        &self,
        evidence: &EvidenceBundle,
        window: TimeWindow,
    ) -> Vec<EvidenceEntry> {
        let searches = evidence.correlated_services().into_iter().map(|service| async move {
            let label = format!("service {}", service);
            match self.search_traces(service, window).await {
                Ok(traces) if traces.is_empty() => {
                    EvidenceEntry::empty(label, "no traces in window")
                }
                Ok(traces) => EvidenceEntry::new(label, EvidencePayload::TraceList { traces }),
                Err(e) => {
                    warn!("Trace search for {} failed: {}", service, e);
                    EvidenceEntry::failed(label, &format!("search:{}", service), e)
                }
            }
        });
        join_all(searches).await
    }

    async fn fetch_origin(&self, start: &SignalSelector, window: TimeWindow) -> EvidenceEntry {
        let target = match start {
            SignalSelector::Metric { query } => CorrelationTarget::Metric {
                metric_name: query.clone(),
            },
            SignalSelector::Trace { trace_id } => CorrelationTarget::Trace {
                trace_id: trace_id.clone(),
            },
        };
        let mut entry = self.fetch_target(&target, window).await;
        entry.label = format!("origin {}", entry.label);
        entry
    }

    /// Fetch one signal. Never fails: errors become a `Failed` entry.
    async fn fetch_target(&self, target: &CorrelationTarget, window: TimeWindow) -> EvidenceEntry {
        let label = target.to_string();
        let result = match target {
            CorrelationTarget::Metric { metric_name } => self
                .gateways
                .metrics
                .call(BackendRequest::range_query(metric_name, window), self.gateways.timeout)
                .await
                .and_then(|r| decode_matrix(metric_name, &r.body))
                .map(|data| {
                    if data.is_empty() {
                        EvidencePayload::Empty {
                            note: "no series in window".to_string(),
                        }
                    } else {
                        EvidencePayload::Metric(data)
                    }
                }),
            CorrelationTarget::Trace { trace_id } => self
                .gateways
                .traces
                .call(BackendRequest::trace_by_id(trace_id), self.gateways.timeout)
                .await
                .and_then(|r| {
                    if r.is_empty() {
                        Ok(EvidencePayload::Empty {
                            note: "trace not found".to_string(),
                        })
                    } else {
                        decode_trace(trace_id, &r.body).map(EvidencePayload::Trace)
                    }
                }),
        };

        match result {
            Ok(payload) => EvidenceEntry::new(label, payload),
            Err(e) => {
                warn!("Fetch of {} failed: {}", label, e);
                EvidenceEntry::failed(label.clone(), &label, e)
            }
        }
    }
}
