use super::{print_json, Context};
use crate::cli::WindowArgs;
use serde_json::json;

pub async fn run(ctx: &Context, service: &str, window: &WindowArgs) -> anyhow::Result<()> {
    let window = window.resolve()?;
    let traces = ctx.orchestrator().search_traces(service, window).await?;
    print_json(&json!({
        "service": service,
        "start_ts": window.start_ts(),
        "end_ts": window.end_ts(),
        "count": traces.len(),
        "traces": traces,
        "analysis_timestamp": chrono::Utc::now(),
    }))
}
