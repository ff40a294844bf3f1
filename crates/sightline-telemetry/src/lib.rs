//! Audit trail, path resolution and prompt size estimation

mod io;
mod paths;
mod tokens;
mod types;

pub use io::{AuditLog, AuditStats};
pub use paths::Paths;
pub use tokens::estimate_tokens;
pub use types::{AuditKind, AuditRecord};
