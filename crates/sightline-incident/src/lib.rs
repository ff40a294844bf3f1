//! Free-text incident analysis

mod analyzer;
mod keywords;

pub use analyzer::{IncidentAnalyzer, IncidentReport, CheckRun};
pub use keywords::{check_metrics, extract_keywords, Check, VOCABULARY};
