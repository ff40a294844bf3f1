pub mod analyze;
pub mod categories;
pub mod correlate;
pub mod history;
pub mod incident;
pub mod traces;
pub mod version;

mod context;

pub use context::{print_json, Context};
