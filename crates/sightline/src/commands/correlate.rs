use super::{print_json, Context};
use crate::cli::WindowArgs;
use serde::Serialize;
use sightline_core::{AnalysisResult, Severity, SignalSelector};
use sightline_correlate::{CorrelationOutcome, CorrelationReport};
use sightline_llm::SummaryRequest;
use sightline_telemetry::{AuditKind, AuditRecord};

#[derive(Serialize)]
struct AnalyzedCorrelation<'a> {
    #[serde(flatten)]
    report: &'a CorrelationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    analysis: Option<AnalysisResult>,
}

pub async fn metric_to_traces(
    ctx: &Context,
    query: &str,
    analyze: bool,
    window: &WindowArgs,
) -> anyhow::Result<()> {
    run(ctx, SignalSelector::metric(query), analyze, window).await
}

pub async fn trace_to_metrics(
    ctx: &Context,
    trace_id: &str,
    analyze: bool,
    window: &WindowArgs,
) -> anyhow::Result<()> {
    run(ctx, SignalSelector::parse_trace(trace_id)?, analyze, window).await
}

async fn run(
    ctx: &Context,
    start: SignalSelector,
    analyze: bool,
    window: &WindowArgs,
) -> anyhow::Result<()> {
    let window = window.resolve()?;
    let subject = start.to_query();
    let orchestrator = ctx.orchestrator();
    let outcome = orchestrator.correlate(start, window).await;

    let report = match &outcome {
        CorrelationOutcome::Aggregated(report) => report,
        CorrelationOutcome::Errored { reason, .. } => {
            ctx.record(&AuditRecord::from_error(AuditKind::Correlation, &subject, reason));
            return print_json(&outcome);
        }
    };

    let analysis = if analyze {
        let mut evidence = report.evidence.clone().with_description(&subject);
        evidence.entries.insert(0, report.origin.clone());
        for entry in orchestrator.service_traces(&report.evidence, window).await {
            evidence.push(entry);
        }
        let request = SummaryRequest::incident(
            &format!(
                "{} signals correlated with {}",
                report.goal.as_str(),
                subject
            ),
            Severity::from_correlation_count(report.correlations.count()),
        );
        let analysis = ctx.pipeline().summarize(&evidence, &request).await;
        ctx.record(&AuditRecord::from_analysis(
            AuditKind::Correlation,
            &subject,
            &analysis,
            &evidence,
        ));
        Some(analysis)
    } else {
        ctx.record(&AuditRecord::from_correlation(&subject, &report.evidence));
        None
    };

    print_json(&AnalyzedCorrelation { report, analysis })
}
