use clap::{Args, Parser, Subcommand};
use sightline_core::{InputError, TimeRangeInput, TimeWindow};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sightline")]
#[command(version)]
#[command(about = "Cross-signal correlation and LLM analysis for OpenShift AI workloads")]
pub struct Cli {
    /// JSON config file (defaults to ~/.sightline/config.json when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Do not append results to the audit trail
    #[arg(long, global = true)]
    pub no_audit: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Analyze a metric category for a scope
    Analyze {
        #[command(flatten)]
        target: CategoryArgs,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Ask a question about a metric category
    Chat {
        #[command(flatten)]
        target: CategoryArgs,
        /// The question for the LLM
        #[arg(short, long)]
        question: String,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Correlate metrics and traces through the correlation graph
    Correlate {
        #[command(subcommand)]
        direction: Direction,
    },

    /// Search traces of one service
    Traces {
        #[arg(short, long)]
        service: String,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// Analyze a free-text incident description
    Incident {
        #[arg(short, long)]
        description: String,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// List metric categories per scope
    Categories,

    /// View the audit trail
    History {
        /// Show statistics summary
        #[arg(long)]
        stats: bool,
        /// Number of most recent records to show
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Print version information
    Version,
}

#[derive(Subcommand)]
pub enum Direction {
    /// From a PromQL query to related traces
    MetricToTraces {
        #[arg(short, long)]
        query: String,
        /// Also summarize the evidence with the LLM
        #[arg(long)]
        analyze: bool,
        #[command(flatten)]
        window: WindowArgs,
    },

    /// From a trace ID to related metrics
    TraceToMetrics {
        #[arg(short, long)]
        trace_id: String,
        #[arg(long)]
        analyze: bool,
        #[command(flatten)]
        window: WindowArgs,
    },
}

#[derive(Args, Debug, Clone)]
pub struct CategoryArgs {
    /// Metric category, e.g. "Fleet Overview"
    #[arg(short, long)]
    pub category: String,
    /// cluster_wide or namespace_scoped
    #[arg(long, default_value = "cluster_wide")]
    pub scope: String,
    /// Required for namespace_scoped
    #[arg(short, long)]
    pub namespace: Option<String>,
}

/// At most one time form; none means the last hour
#[derive(Args, Debug, Clone, Default)]
pub struct WindowArgs {
    /// Relative window ending now: 30m, 1h, 24h, 7d
    #[arg(long)]
    pub time_range: Option<String>,
    /// ISO-8601 start, with --end-datetime
    #[arg(long)]
    pub start_datetime: Option<String>,
    #[arg(long)]
    pub end_datetime: Option<String>,
    /// Epoch seconds start, with --end-ts
    #[arg(long)]
    pub start_ts: Option<i64>,
    #[arg(long)]
    pub end_ts: Option<i64>,
}

impl WindowArgs {
    pub fn resolve(&self) -> Result<TimeWindow, InputError> {
        let input = TimeRangeInput {
            time_range: self.time_range.clone(),
            start_datetime: self.start_datetime.clone(),
            end_datetime: self.end_datetime.clone(),
            start_ts: self.start_ts,
            end_ts: self.end_ts,
        };
        if input == TimeRangeInput::default() {
            return TimeRangeInput::relative("1h").resolve();
        }
        input.resolve()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat() {
        let cli = Cli::try_parse_from([
            "sightline",
            "--no-audit",
            "chat",
            "--category",
            "Workloads & Pods",
            "--scope",
            "namespace_scoped",
            "--namespace",
            "team-a",
            "-q",
            "Which pods restart?",
            "--time-range",
            "6h",
        ])
        .unwrap();
        assert!(cli.no_audit);
        match cli.command {
            Commands::Chat {
                target, window, ..
            } => {
                assert_eq!(target.namespace.as_deref(), Some("team-a"));
                assert_eq!(window.resolve().unwrap().duration_secs(), 6 * 3600);
            }
            _ => panic!("expected chat"),
        }
    }

    #[test]
    fn test_default_window_is_last_hour() {
        let window = WindowArgs::default().resolve().unwrap();
        assert_eq!(window.duration_secs(), 3600);
    }

    #[test]
    fn test_conflicting_window_forms() {
        let args = WindowArgs {
            time_range: Some("1h".to_string()),
            start_ts: Some(1000),
            end_ts: Some(2000),
            ..Default::default()
        };
        assert!(matches!(args.resolve(), Err(InputError::InvalidTimeRange(_))));
    }
}
