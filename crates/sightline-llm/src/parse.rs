//! Defensive decoding of LLM replies.
//!
//! The model is asked for bare JSON but often wraps it in prose or code
//! fences. [`find_json_object`] scans for balanced `{...}` spans and
//! [`parse_response`] decodes the first object against the expected schema,
//! degrading to an unstructured result instead of failing.

use crate::prompt::ResponseSchema;
use serde_json::{Map, Value};
use sightline_core::{AnalysisResult, ResultOrigin, Severity};

/// Spans tried before giving up
const MAX_CANDIDATES: usize = 16;
/// Bytes of reply text considered at all
const MAX_SCAN_BYTES: usize = 64 * 1024;

/// First balanced `{...}` span in `text` that decodes to a JSON object.
///
/// Braces inside string literals are ignored. Spans that are balanced but
/// not valid JSON are skipped, as are unterminated ones. At most
/// `MAX_CANDIDATES` opening braces are tried.
pub fn find_json_object(text: &str) -> Option<Map<String, Value>> {
    let mut end = text.len().min(MAX_SCAN_BYTES);
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let text = &text[..end];
    let bytes = text.as_bytes();

    let mut tried = 0;
    let mut from = 0;
    while tried < MAX_CANDIDATES {
        let start = from + text[from..].find('{')?;
        from = start + 1;
        tried += 1;

        let Some(close) = balanced_end(&bytes[start..]) else {
            continue;
        };
        if let Ok(Value::Object(map)) = serde_json::from_str(&text[start..=start + close]) {
            return Some(map);
        }
    }
    None
}

/// Offset of the brace closing the one at `bytes[0]`
fn balanced_end(bytes: &[u8]) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Decode an LLM reply. Never fails: undecodable replies come back with
/// `structured = false` and the raw text preserved.
pub fn parse_response(raw: &str, schema: ResponseSchema, severity_hint: Severity) -> AnalysisResult {
    let Some(object) = find_json_object(raw) else {
        return AnalysisResult::degraded(raw, "no JSON object found in LLM reply", severity_hint);
    };

    if !schema.keys().iter().any(|k| object.contains_key(*k)) {
        return AnalysisResult::degraded(
            raw,
            format!("JSON object has none of the expected keys ({})", schema.keys().join(", ")),
            severity_hint,
        );
    }

    match schema {
        ResponseSchema::QueryAnswer => decode_answer(&object, raw, severity_hint),
        ResponseSchema::Incident => decode_incident(&object, severity_hint),
    }
}

fn decode_answer(object: &Map<String, Value>, raw: &str, severity_hint: Severity) -> AnalysisResult {
    let promql = text_field(object, "promql").filter(|q| !q.is_empty());
    let summary = text_field(object, "summary")
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| raw.trim().to_string());

    AnalysisResult {
        root_cause: "Unknown".to_string(),
        impact: "Unknown".to_string(),
        recommendations: Vec::new(),
        severity: severity_hint,
        structured: true,
        origin: ResultOrigin::Llm,
        timeline_analysis: None,
        promql,
        summary: Some(summary),
        analysis: None,
        parse_error: None,
        llm_error: None,
    }
}

fn decode_incident(object: &Map<String, Value>, severity_hint: Severity) -> AnalysisResult {
    let recommendations = list_field(object, "recommendations")
        .or_else(|| list_field(object, "immediate_actions"))
        .unwrap_or_default();
    let severity = text_field(object, "severity")
        .and_then(|s| Severity::parse(&s))
        .unwrap_or(severity_hint);

    AnalysisResult {
        root_cause: text_field(object, "root_cause").unwrap_or_else(|| "Unknown".to_string()),
        impact: text_field(object, "impact").unwrap_or_else(|| "Unknown".to_string()),
        recommendations,
        severity,
        structured: true,
        origin: ResultOrigin::Llm,
        timeline_analysis: text_field(object, "timeline_analysis"),
        promql: None,
        summary: None,
        analysis: None,
        parse_error: None,
        llm_error: None,
    }
}

/// A string field, or any other non-null value rendered as JSON text
fn text_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn list_field(object: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    match object.get(key)? {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s.trim().to_string()),
                    Value::Null => None,
                    other => Some(other.to_string()),
                })
                .filter(|s| !s.is_empty())
                .collect(),
        ),
        Value::String(s) if !s.trim().is_empty() => Some(vec![s.trim().to_string()]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_surrounded_by_noise() {
        let raw = r#"noise noise {"promql": "up", "summary": "ok"} trailing"#;
        let result = parse_response(raw, ResponseSchema::QueryAnswer, Severity::Low);
        assert!(result.structured);
        assert_eq!(result.promql.as_deref(), Some("up"));
        assert_eq!(result.summary.as_deref(), Some("ok"));
    }

    #[test]
    fn test_non_json_reply_is_degraded() {
        let raw = "The cluster looks healthy overall.";
        let result = parse_response(raw, ResponseSchema::Incident, Severity::Medium);
        assert!(!result.structured);
        assert_eq!(result.analysis.as_deref(), Some(raw));
        assert_eq!(result.severity, Severity::Medium);
        assert!(result.parse_error.is_some());
    }

    #[test]
    fn test_braces_inside_strings() {
        let raw = r#"Here: {"promql": "sum(rate(x{job=\"api\"}[5m]))", "summary": "a } brace"}"#;
        let object = find_json_object(raw).unwrap();
        assert_eq!(object["promql"], r#"sum(rate(x{job="api"}[5m]))"#);
        assert_eq!(object["summary"], "a } brace");
    }

    #[test]
    fn test_skips_invalid_span() {
        let raw = r#"use {namespace} then {"summary": "second"}"#;
        assert_eq!(find_json_object(raw).unwrap()["summary"], "second");
    }

    #[test]
    fn test_unterminated_object() {
        assert!(find_json_object(r#"{"summary": "cut off"#).is_none());
        assert!(find_json_object("").is_none());
    }

    #[test]
    fn test_code_fence() {
        let raw = "```json\n{\"root_cause\": \"OOM kills\", \"severity\": \"HIGH\", \
                   \"recommendations\": \"Raise memory limits\"}\n```";
        let result = parse_response(raw, ResponseSchema::Incident, Severity::Low);
        assert!(result.structured);
        assert_eq!(result.root_cause, "OOM kills");
        assert_eq!(result.impact, "Unknown");
        assert_eq!(result.severity, Severity::High);
        assert_eq!(result.recommendations, vec!["Raise memory limits".to_string()]);
    }

    #[test]
    fn test_unknown_severity_uses_hint() {
        let raw = r#"{"root_cause": "x", "severity": "apocalyptic"}"#;
        let result = parse_response(raw, ResponseSchema::Incident, Severity::Low);
        assert_eq!(result.severity, Severity::Low);
    }

    #[test]
    fn test_wrong_schema_is_degraded() {
        let raw = r#"{"answer": 42}"#;
        let result = parse_response(raw, ResponseSchema::QueryAnswer, Severity::Low);
        assert!(result.is_degraded());
        assert_eq!(result.analysis.as_deref(), Some(raw));
    }

    #[test]
    fn test_missing_summary_falls_back_to_raw() {
        let raw = r#"{"promql": "up"}"#;
        let result = parse_response(raw, ResponseSchema::QueryAnswer, Severity::Low);
        assert_eq!(result.summary.as_deref(), Some(raw));
    }

    #[test]
    fn test_non_ascii_prefix() {
        let raw = "Résumé → {\"summary\": \"ünïcode\"}";
        assert_eq!(find_json_object(raw).unwrap()["summary"], "ünïcode");
    }
}
