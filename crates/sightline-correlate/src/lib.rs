//! Cross-signal correlation and category analysis

mod category;
mod decode;
mod orchestrator;

pub use category::{CategoryAnalyzer, CategoryReport, CategoryRequest, NO_DATA_SUMMARY};
pub use decode::{decode_edges, decode_matrix, decode_search, decode_trace};
pub use orchestrator::{
    CorrelationOrchestrator, CorrelationOutcome, CorrelationReport, CorrelationState,
    NO_CORRELATIONS,
};
