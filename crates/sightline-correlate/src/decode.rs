//! Payload decoders for the graph, metrics and trace backends

use serde_json::Value;
use sightline_core::{CorrelationEdge, CorrelationTarget, MetricData, Series, TraceSummary};
use sightline_gateway::BackendError;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Edges from a goals reply. Results without a trace or metric target are
/// skipped; a missing `results` array is an empty graph.
pub fn decode_edges(body: &Value) -> Result<Vec<CorrelationEdge>, BackendError> {
    let results = match body.get("results") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(BackendError::Malformed("`results` is not an array".to_string())),
    };

    let mut edges = Vec::with_capacity(results.len());
    for item in results {
        let target = if let Some(id) = str_field(item, "trace_id") {
            CorrelationTarget::Trace { trace_id: id }
        } else if let Some(name) = str_field(item, "metric_name") {
            CorrelationTarget::Metric { metric_name: name }
        } else {
            debug!("Skipping graph result without target: {}", item);
            continue;
        };
        edges.push(CorrelationEdge {
            rule: str_field(item, "rule").unwrap_or_else(|| "unknown".to_string()),
            service_name: str_field(item, "service_name").unwrap_or_else(|| "unknown".to_string()),
            target,
        });
    }
    Ok(edges)
}

/// Series from a Prometheus range (`matrix`) or instant (`vector`) reply
pub fn decode_matrix(query: &str, body: &Value) -> Result<MetricData, BackendError> {
    if body.is_null() {
        return Ok(MetricData {
            query: query.to_string(),
            series: Vec::new(),
        });
    }
    if body.get("status").and_then(Value::as_str) == Some("error") {
        let reason = body
            .get("error")
            .and_then(Value::as_str)
            .unwrap_or("query failed");
        return Err(BackendError::Malformed(reason.to_string()));
    }

    let result = body
        .pointer("/data/result")
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Malformed("missing data.result".to_string()))?;

    let series = result
        .iter()
        .map(|item| {
            let labels: BTreeMap<String, String> = item
                .get("metric")
                .and_then(Value::as_object)
                .map(|m| {
                    m.iter()
                        .map(|(k, v)| (k.clone(), v.as_str().unwrap_or_default().to_string()))
                        .collect()
                })
                .unwrap_or_default();
            let points = match item.get("values").and_then(Value::as_array) {
                Some(values) => values.iter().filter_map(sample).collect(),
                None => item.get("value").and_then(sample).into_iter().collect(),
            };
            Series { labels, points }
        })
        .collect();

    Ok(MetricData {
        query: query.to_string(),
        series,
    })
}

/// `[ts, "value"]`
fn sample(pair: &Value) -> Option<(i64, f64)> {
    let ts = pair.get(0)?.as_f64()? as i64;
    let value = match pair.get(1)? {
        Value::String(s) => s.parse().ok()?,
        other => other.as_f64()?,
    };
    Some((ts, value))
}

/// Summary of a trace-by-id reply in OTLP JSON form
pub fn decode_trace(trace_id: &str, body: &Value) -> Result<TraceSummary, BackendError> {
    let batches = body
        .get("batches")
        .or_else(|| body.get("resourceSpans"))
        .or_else(|| body.pointer("/trace/resourceSpans"))
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Malformed("no batches in trace".to_string()))?;

    let mut services = BTreeSet::new();
    let mut span_count = 0;
    let mut first_start = u64::MAX;
    let mut last_end = 0u64;
    let mut root: Option<(String, String)> = None;

    for batch in batches {
        let service = batch
            .pointer("/resource/attributes")
            .and_then(Value::as_array)
            .and_then(|attrs| {
                attrs
                    .iter()
                    .find(|a| a.get("key").and_then(Value::as_str) == Some("service.name"))
            })
            .and_then(|a| a.pointer("/value/stringValue"))
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        services.insert(service.clone());

        let scopes = batch
            .get("scopeSpans")
            .or_else(|| batch.get("instrumentationLibrarySpans"))
            .and_then(Value::as_array);
        for scope in scopes.into_iter().flatten() {
            for span in scope.get("spans").and_then(Value::as_array).into_iter().flatten() {
                span_count += 1;
                if let Some(start) = nanos(span, "startTimeUnixNano") {
                    first_start = first_start.min(start);
                }
                if let Some(end) = nanos(span, "endTimeUnixNano") {
                    last_end = last_end.max(end);
                }
                let parent = span.get("parentSpanId").and_then(Value::as_str).unwrap_or("");
                if parent.is_empty() && root.is_none() {
                    let name = span.get("name").and_then(Value::as_str).unwrap_or("").to_string();
                    root = Some((service.clone(), name));
                }
            }
        }
    }

    let (duration_ms, start_ts) = if first_start <= last_end {
        (
            (last_end - first_start) as f64 / 1_000_000.0,
            Some((first_start / 1_000_000_000) as i64),
        )
    } else {
        (0.0, None)
    };
    let (root_service, root_name) = match root {
        Some((service, name)) => (Some(service), Some(name).filter(|n| !n.is_empty())),
        None => (None, None),
    };

    Ok(TraceSummary {
        trace_id: trace_id.to_string(),
        root_service,
        root_name,
        services: services.into_iter().collect(),
        span_count,
        duration_ms,
        start_ts,
    })
}

/// Nanosecond timestamps arrive as strings or numbers
fn nanos(span: &Value, key: &str) -> Option<u64> {
    match span.get(key)? {
        Value::String(s) => s.parse().ok(),
        other => other.as_u64(),
    }
}

/// Summaries from a trace search reply
pub fn decode_search(body: &Value) -> Result<Vec<TraceSummary>, BackendError> {
    let traces = match body.get("traces") {
        None | Some(Value::Null) => return Ok(Vec::new()),
        Some(Value::Array(items)) => items,
        Some(_) => return Err(BackendError::Malformed("`traces` is not an array".to_string())),
    };

    Ok(traces
        .iter()
        .filter_map(|t| {
            let trace_id = str_field(t, "traceID")?;
            let root_service = str_field(t, "rootServiceName");
            Some(TraceSummary {
                trace_id,
                services: root_service.iter().cloned().collect(),
                root_service,
                root_name: str_field(t, "rootTraceName"),
                span_count: t.get("spanCount").and_then(Value::as_u64).unwrap_or(0) as usize,
                duration_ms: t.get("durationMs").and_then(Value::as_f64).unwrap_or(0.0),
                start_ts: nanos(t, "startTimeUnixNano").map(|n| (n / 1_000_000_000) as i64),
            })
        })
        .collect())
}

fn str_field(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_edges() {
        let body = json!({"results": [
            {"rule": "MetricToTrace", "service_name": "checkout", "trace_id": "t1"},
            {"rule": "TraceToMetric", "service_name": "cart", "metric_name": "http_requests_total"},
            {"rule": "Other", "service_name": "x"},
        ]});
        let edges = decode_edges(&body).unwrap();
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].target.to_string(), "trace:t1");
        assert_eq!(edges[1].target.to_string(), "metric:http_requests_total");
        assert!(decode_edges(&Value::Null).unwrap().is_empty());
        assert!(decode_edges(&json!({"results": "nope"})).is_err());
    }

    #[test]
    fn test_decode_matrix() {
        let body = json!({"status": "success", "data": {"resultType": "matrix", "result": [
            {"metric": {"pod": "api-1"}, "values": [[1700000000, "1.5"], [1700000030, "2"]]},
            {"metric": {"pod": "api-2"}, "values": [[1700000000, "NaN"]]},
        ]}});
        let data = decode_matrix("rate(x[5m])", &body).unwrap();
        assert_eq!(data.series.len(), 2);
        assert_eq!(data.series[0].labels["pod"], "api-1");
        assert_eq!(data.series[0].points, vec![(1700000000, 1.5), (1700000030, 2.0)]);
        assert_eq!(data.stats().unwrap().points, 2);
    }

    #[test]
    fn test_decode_matrix_error_status() {
        let body = json!({"status": "error", "errorType": "bad_data", "error": "parse error"});
        assert_eq!(
            decode_matrix("up{", &body),
            Err(BackendError::Malformed("parse error".to_string()))
        );
    }

    #[test]
    fn test_decode_trace() {
        let body = json!({"batches": [
            {
                "resource": {"attributes": [{"key": "service.name", "value": {"stringValue": "frontend"}}]},
                "scopeSpans": [{"spans": [
                    {"name": "GET /checkout", "parentSpanId": "", "startTimeUnixNano": "1700000000000000000", "endTimeUnixNano": "1700000000250000000"},
                ]}]
            },
            {
                "resource": {"attributes": [{"key": "service.name", "value": {"stringValue": "payments"}}]},
                "instrumentationLibrarySpans": [{"spans": [
                    {"name": "charge", "parentSpanId": "abc", "startTimeUnixNano": "1700000000050000000", "endTimeUnixNano": "1700000000200000000"},
                ]}]
            }
        ]});
        let trace = decode_trace("t1", &body).unwrap();
        assert_eq!(trace.span_count, 2);
        assert_eq!(trace.services, vec!["frontend".to_string(), "payments".to_string()]);
        assert_eq!(trace.root_service.as_deref(), Some("frontend"));
        assert_eq!(trace.root_name.as_deref(), Some("GET /checkout"));
        assert!((trace.duration_ms - 250.0).abs() < 1e-6);
        assert_eq!(trace.start_ts, Some(1_700_000_000));
    }

    #[test]
    fn test_decode_search() {
        let body = json!({"traces": [
            {"traceID": "abc", "rootServiceName": "checkout", "rootTraceName": "POST /pay", "durationMs": 812},
            {"rootServiceName": "no id"},
        ]});
        let traces = decode_search(&body).unwrap();
        assert_eq!(traces.len(), 1);
        assert_eq!(traces[0].duration_ms, 812.0);
        assert_eq!(traces[0].services, vec!["checkout".to_string()]);
    }
}
