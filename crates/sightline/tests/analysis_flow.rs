mod common;

use common::{matrix, sample_window, Harness};
use sightline_core::{
    inject_namespace, InputError, MetricCategory, ResultOrigin, Scope, TimeRangeInput,
};
use sightline_correlate::{CategoryAnalyzer, CategoryRequest};
use sightline_gateway::{FakeBackend, FakeReply};
use sightline_incident::IncidentAnalyzer;
use sightline_llm::FakeLlmClient;

fn category_request(category: &str, scope: Scope, question: Option<&str>) -> CategoryRequest {
    CategoryRequest {
        category: MetricCategory::new(category),
        scope,
        window: sample_window(),
        question: question.map(str::to_string),
    }
}

#[tokio::test]
async fn test_namespace_chat_end_to_end() {
    let harness = Harness::new(
        FakeBackend::new("graph"),
        FakeBackend::new("metrics").fallback(FakeReply::ok(matrix("12"))),
        FakeBackend::new("traces"),
        FakeLlmClient::new().reply(
            "Here is what I found:\n```json\n{\"promql\": \"sum(kube_pod_status_phase{phase=\\\"Running\\\"})\", \"summary\": \"12 pods are running in team-a\"}\n```",
        ),
    );
    let analyzer = CategoryAnalyzer::new(harness.gateways(), harness.pipeline());

    let report = analyzer
        .analyze(&category_request(
            "Workloads & Pods",
            Scope::namespaced("team-a").unwrap(),
            Some("How many pods are running?"),
        ))
        .await
        .unwrap();

    assert_eq!(report.namespace, "team-a");
    assert!(!report.degraded_scope);
    assert!(report.analysis.structured);
    assert_eq!(
        report.promql,
        r#"sum(kube_pod_status_phase{namespace="team-a", phase="Running"})"#
    );
    assert_eq!(report.summary, "12 pods are running in team-a");

    let prompt = &harness.llm.prompts()[0];
    assert!(prompt.contains("Pods Running"));
    assert!(prompt.contains("How many pods are running?"));
    assert!(harness
        .metrics
        .calls()
        .iter()
        .all(|key| key.contains(r#"namespace="team-a""#)));
}

#[tokio::test]
async fn test_prose_reply_is_degraded_not_an_error() {
    let harness = Harness::new(
        FakeBackend::new("graph"),
        FakeBackend::new("metrics").fallback(FakeReply::ok(matrix("3"))),
        FakeBackend::new("traces"),
        FakeLlmClient::new().reply("Everything looks healthy to me."),
    );
    let analyzer = CategoryAnalyzer::new(harness.gateways(), harness.pipeline());

    let report = analyzer
        .analyze(&category_request("Fleet Overview", Scope::ClusterWide, None))
        .await
        .unwrap();
    assert!(report.analysis.is_degraded());
    assert_eq!(report.analysis.origin, ResultOrigin::Llm);
    assert_eq!(
        report.analysis.analysis.as_deref(),
        Some("Everything looks healthy to me.")
    );
}

#[test]
fn test_unknown_scope_rejected() {
    assert!(matches!(
        Scope::from_parts("galaxy_wide", None),
        Err(InputError::InvalidScope(_))
    ));
    assert!(Scope::from_parts("namespace_scoped", None).is_err());
}

#[tokio::test]
async fn test_incident_runs_one_check_per_keyword() {
    let harness = Harness::new(
        FakeBackend::new("graph").fallback(FakeReply::ok(serde_json::json!({"results": []}))),
        FakeBackend::new("metrics"),
        FakeBackend::new("traces"),
        FakeLlmClient::new().reply(
            r#"{"root_cause": "node pressure", "impact": "slow checkout", "recommendations": ["scale out"], "severity": "high", "timeline_analysis": "started 14:00"}"#,
        ),
    );
    let analyzer = IncidentAnalyzer::new(harness.orchestrator(), harness.pipeline());

    let report = analyzer
        .analyze("High CPU and memory usage on checkout pods", sample_window())
        .await;

    assert_eq!(harness.graph.call_count(), 2);
    let checks: Vec<&str> = report.checks.iter().map(|p| p.check.metric).collect();
    assert_eq!(checks, vec!["cpu_usage_percent", "memory_usage_bytes"]);
    assert_eq!(report.total_correlations, 0);
    assert_eq!(report.analysis.recommendations, vec!["scale out".to_string()]);
    assert_eq!(report.analysis.timeline_analysis.as_deref(), Some("started 14:00"));
}

#[test]
fn test_relative_window_ends_now() {
    let before = chrono::Utc::now().timestamp();
    let window = TimeRangeInput::relative("24h").resolve().unwrap();
    let after = chrono::Utc::now().timestamp();

    assert!(window.end_ts() >= before && window.end_ts() <= after);
    assert_eq!(window.end_ts() - window.start_ts(), 86_400);
}

#[test]
fn test_inverted_window_rejected() {
    let input = TimeRangeInput {
        start_ts: Some(1_700_003_600),
        end_ts: Some(1_700_000_000),
        ..Default::default()
    };
    assert!(matches!(input.resolve(), Err(InputError::InvalidTimeRange(_))));
}

#[test]
fn test_namespace_injection_is_idempotent() {
    let once = inject_namespace(
        r#"sum(rate(container_cpu_usage_seconds_total{container!=""}[5m]))"#,
        "team-a",
    );
    assert_eq!(
        once,
        r#"sum(rate(container_cpu_usage_seconds_total{namespace="team-a", container!=""}[5m]))"#
    );
    assert_eq!(inject_namespace(&once, "team-a"), once);
}
