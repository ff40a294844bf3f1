//! Prompt templates

use crate::pipeline::SummaryRequest;
use sightline_core::{EvidenceBundle, EvidencePayload, TraceSummary};
use sightline_telemetry::estimate_tokens;

pub const STOP_SEQUENCES: [&str; 2] = ["Human:", "Assistant:"];

const MAX_TRACES_PER_LIST: usize = 5;

/// Shape the LLM is instructed to answer in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    /// `{"promql", "summary"}`, used when the caller asked a question
    QueryAnswer,
    /// `{"root_cause", "impact", "recommendations", "severity", "timeline_analysis"}`
    Incident,
}

impl ResponseSchema {
    pub fn for_question(question: Option<&str>) -> Self {
        match question {
            Some(q) if !q.trim().is_empty() => ResponseSchema::QueryAnswer,
            _ => ResponseSchema::Incident,
        }
    }

    pub fn keys(&self) -> &'static [&'static str] {
        match self {
            ResponseSchema::QueryAnswer => &["promql", "summary"],
            ResponseSchema::Incident => &[
                "root_cause",
                "impact",
                "recommendations",
                "severity",
                "timeline_analysis",
            ],
        }
    }
}

pub fn build_prompt(evidence: &EvidenceBundle, request: &SummaryRequest, token_budget: usize) -> String {
    let mut prompt = format!(
        "You are a senior Site Reliability Engineer (SRE) analyzing {}.\n\n",
        request.subject
    );

    if let Some(description) = &evidence.description {
        prompt.push_str("INCIDENT DESCRIPTION:\n");
        prompt.push_str(description);
        prompt.push_str("\n\n");
    }

    prompt.push_str("EVIDENCE:\n");
    let lines = evidence_lines(evidence);
    if lines.is_empty() {
        prompt.push_str("- No metric or trace data was collected.\n");
    }
    let mut used = 0;
    for (shown, line) in lines.iter().enumerate() {
        let cost = estimate_tokens(line);
        if used + cost > token_budget {
            prompt.push_str(&format!(
                "- ... {} more evidence lines omitted to fit the prompt budget\n",
                lines.len() - shown
            ));
            break;
        }
        used += cost;
        prompt.push_str(line);
        prompt.push('\n');
    }

    if !evidence.correlations.is_empty() {
        prompt.push('\n');
        prompt.push_str(&correlation_section(evidence));
    }

    match ResponseSchema::for_question(request.question.as_deref()) {
        ResponseSchema::QueryAnswer => {
            prompt.push_str(&format!(
                "\nUser Question: {}\n\
                 Provide a concise technical response focusing on operational insights and recommendations.\n\
                 Your response should be in JSON format: \
                 {{\"promql\": \"relevant_query_if_applicable\", \"summary\": \"your_analysis\"}}\n\
                 Do not add any additional text or commentary.\n",
                request.question.as_deref().unwrap_or_default().trim()
            ));
        }
        ResponseSchema::Incident => {
            prompt.push_str(
                "\nProvide a comprehensive analysis in JSON format with these keys:\n\
                 - root_cause: Primary cause of the issue\n\
                 - impact: Business and technical impact\n\
                 - recommendations: List of specific actions\n\
                 - severity: low/medium/high/critical\n\
                 - timeline_analysis: Key events and their relationships\n\
                 Do not add any additional text or commentary.\n",
            );
        }
    }

    prompt.push_str("\nAnalysis:");
    prompt
}

/// One bullet per evidence entry, in bundle order
fn evidence_lines(evidence: &EvidenceBundle) -> Vec<String> {
    let mut lines = Vec::new();
    for entry in &evidence.entries {
        match &entry.payload {
            EvidencePayload::Metric(data) => match data.stats() {
                Some(s) => lines.push(format!(
                    "- {}: latest={} avg={} min={} max={} ({} points, {} series)",
                    entry.label,
                    fmt_value(s.latest),
                    fmt_value(s.avg),
                    fmt_value(s.min),
                    fmt_value(s.max),
                    s.points,
                    data.series.len()
                )),
                None => lines.push(format!("- {}: NO DATA (query returned no points)", entry.label)),
            },
            EvidencePayload::Trace(trace) => {
                lines.push(format!("- {}: {}", entry.label, trace_line(trace)));
            }
            EvidencePayload::TraceList { traces } => {
                lines.push(format!("- {}: {} traces", entry.label, traces.len()));
                for trace in traces.iter().take(MAX_TRACES_PER_LIST) {
                    lines.push(format!("  - {}", trace_line(trace)));
                }
            }
            EvidencePayload::Empty { note } => {
                lines.push(format!("- {}: NO DATA ({})", entry.label, note));
            }
            EvidencePayload::Failed { reason } => {
                lines.push(format!("- {}: LOOKUP FAILED ({})", entry.label, reason));
            }
        }
    }
    lines
}

fn trace_line(trace: &TraceSummary) -> String {
    let id: String = trace.trace_id.chars().take(16).collect();
    let root = match (&trace.root_service, &trace.root_name) {
        (Some(service), Some(name)) => format!(" {} {}", service, name),
        (Some(service), None) => format!(" {}", service),
        _ => String::new(),
    };
    format!(
        "Trace {}{}: {:.1}ms, {} spans, services: {}",
        id,
        root,
        trace.duration_ms,
        trace.span_count,
        if trace.services.is_empty() {
            "unknown".to_string()
        } else {
            trace.services.join(", ")
        }
    )
}

fn correlation_section(evidence: &EvidenceBundle) -> String {
    let services = evidence.correlated_services();
    let rules = evidence.rule_counts();

    format!(
        "CORRELATION ANALYSIS:\n\
         - Total correlations found: {}\n\
         - Related services: {}\n\
         - Correlation types: {}\n",
        evidence.correlations.len(),
        services.into_iter().collect::<Vec<_>>().join(", "),
        rules
            .iter()
            .map(|(rule, n)| format!("{}={}", rule, n))
            .collect::<Vec<_>>()
            .join(", ")
    )
}

fn fmt_value(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.3}", v)
    }
}
