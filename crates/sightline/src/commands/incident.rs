use super::{print_json, Context};
use crate::cli::WindowArgs;
use anyhow::bail;
use sightline_incident::IncidentAnalyzer;
use sightline_telemetry::{AuditKind, AuditRecord};

pub async fn run(ctx: &Context, description: &str, window: &WindowArgs) -> anyhow::Result<()> {
    let description = description.trim();
    if description.is_empty() {
        bail!("incident description must not be empty");
    }
    let window = window.resolve()?;

    let analyzer = IncidentAnalyzer::new(ctx.orchestrator(), ctx.pipeline());
    let report = analyzer.analyze(description, window).await;

    ctx.record(&AuditRecord::from_analysis(
        AuditKind::Incident,
        description,
        &report.analysis,
        &report.evidence,
    ));
    print_json(&report)
}
