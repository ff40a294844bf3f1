mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands, Direction};
use commands::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries JSON payloads only
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => commands::version::run(),
        Commands::Categories => commands::categories::run(),
        Commands::History { stats, limit } => commands::history::run(stats, limit),
        command => {
            let ctx = Context::load(cli.config.as_deref(), cli.no_audit)?;
            match command {
                Commands::Analyze { target, window } => {
                    commands::analyze::run(&ctx, &target, None, &window).await
                }
                Commands::Chat {
                    target,
                    question,
                    window,
                } => commands::analyze::run(&ctx, &target, Some(&question), &window).await,
                Commands::Correlate { direction } => match direction {
                    Direction::MetricToTraces {
                        query,
                        analyze,
                        window,
                    } => commands::correlate::metric_to_traces(&ctx, &query, analyze, &window).await,
                    Direction::TraceToMetrics {
                        trace_id,
                        analyze,
                        window,
                    } => {
                        commands::correlate::trace_to_metrics(&ctx, &trace_id, analyze, &window)
                            .await
                    }
                },
                Commands::Traces { service, window } => {
                    commands::traces::run(&ctx, &service, &window).await
                }
                Commands::Incident {
                    description,
                    window,
                } => commands::incident::run(&ctx, &description, &window).await,
                Commands::Version | Commands::Categories | Commands::History { .. } => Ok(()),
            }
        }
    }
}
