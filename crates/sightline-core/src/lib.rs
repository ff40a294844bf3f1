//! Core types for cross-signal correlation and analysis

mod catalog;
mod config;
mod error;
mod evidence;
mod result;
mod signal;
mod types;
mod window;

pub use catalog::{inject_namespace, NamedQuery, QuerySet, ScopeCatalog};
pub use config::{BackendConfig, Config, CorrelationConfig, LlmConfig};
pub use error::InputError;
pub use evidence::{
    EvidenceBundle, EvidenceEntry, EvidencePayload, MetricData, Series, SeriesStats, TraceSummary,
};
pub use result::{AnalysisResult, ResultOrigin, Severity};
pub use signal::{
    Constraint, CorrelationEdge, CorrelationResult, CorrelationTarget, SignalKind, SignalSelector,
};
pub use types::{MetricCategory, Scope};
pub use window::{TimeRangeInput, TimeWindow};
