use super::{print_json, Context};
use crate::cli::{CategoryArgs, WindowArgs};
use sightline_core::{MetricCategory, Scope};
use sightline_correlate::{CategoryAnalyzer, CategoryRequest};
use sightline_telemetry::{AuditKind, AuditRecord};

/// Category analysis, or chat when `question` is set
pub async fn run(
    ctx: &Context,
    target: &CategoryArgs,
    question: Option<&str>,
    window: &WindowArgs,
) -> anyhow::Result<()> {
    let scope = Scope::from_parts(&target.scope, target.namespace.as_deref())?;
    let window = window.resolve()?;
    let request = CategoryRequest {
        category: MetricCategory::new(target.category.trim()),
        scope,
        window,
        question: question.map(str::to_string),
    };

    let analyzer = CategoryAnalyzer::new(ctx.gateways(), ctx.pipeline());
    let report = analyzer.analyze(&request).await?;

    let subject = format!("{} / {}", request.category, request.scope);
    ctx.record(&AuditRecord::from_analysis(
        AuditKind::Category,
        &subject,
        &report.analysis,
        &report.evidence,
    ));
    print_json(&report)
}
