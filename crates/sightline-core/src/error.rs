//! Input validation errors, surfaced before any network call

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("invalid time range: {0}")]
    InvalidTimeRange(String),

    #[error("unknown metric category '{category}' for scope {scope}")]
    UnknownCategory { category: String, scope: String },

    #[error("invalid scope: {0}")]
    InvalidScope(String),

    #[error("invalid trace id '{0}': expected 1 to 32 hex digits")]
    InvalidTraceId(String),
}
