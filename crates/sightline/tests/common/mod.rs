#![allow(dead_code)]

use serde_json::{json, Value};
use sightline_core::{CorrelationConfig, TimeWindow};
use sightline_correlate::CorrelationOrchestrator;
use sightline_gateway::{FakeBackend, Gateways};
use sightline_llm::{FakeLlmClient, PromptPipeline};
use std::sync::Arc;
use std::time::Duration;

pub struct Harness {
    pub graph: Arc<FakeBackend>,
    pub metrics: Arc<FakeBackend>,
    pub traces: Arc<FakeBackend>,
    pub llm: Arc<FakeLlmClient>,
}

impl Harness {
    pub fn new(graph: FakeBackend, metrics: FakeBackend, traces: FakeBackend, llm: FakeLlmClient) -> Self {
        Self {
            graph: Arc::new(graph),
            metrics: Arc::new(metrics),
            traces: Arc::new(traces),
            llm: Arc::new(llm),
        }
    }

    pub fn gateways(&self) -> Gateways {
        Gateways::new(
            self.graph.clone(),
            self.metrics.clone(),
            self.traces.clone(),
            Duration::from_secs(30),
        )
    }

    pub fn pipeline(&self) -> PromptPipeline {
        PromptPipeline::new(self.llm.clone(), 6000)
    }

    pub fn orchestrator(&self) -> CorrelationOrchestrator {
        CorrelationOrchestrator::new(self.gateways(), &CorrelationConfig::default())
    }

    pub fn secondary_calls(&self) -> usize {
        self.metrics.call_count() + self.traces.call_count()
    }
}

pub fn sample_window() -> TimeWindow {
    TimeWindow::new(1_700_000_000, 1_700_003_600).unwrap()
}

pub fn matrix(value: &str) -> Value {
    json!({"status": "success", "data": {"resultType": "matrix", "result": [
        {"metric": {"pod": "web-0"}, "values": [[1_700_000_000, value], [1_700_000_060, value]]}
    ]}})
}

pub fn trace_body(service: &str) -> Value {
    json!({"batches": [{
        "resource": {"attributes": [{"key": "service.name", "value": {"stringValue": service}}]},
        "scopeSpans": [{"spans": [
            {"name": "GET /checkout", "startTimeUnixNano": "1700000000000000000", "endTimeUnixNano": "1700000000250000000"}
        ]}]
    }]})
}

pub fn trace_edges(ids: &[&str]) -> Value {
    let results: Vec<Value> = ids
        .iter()
        .map(|id| json!({"rule": "MetricToTrace", "service_name": "checkout", "trace_id": id}))
        .collect();
    json!({ "results": results })
}
