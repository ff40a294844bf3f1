//! Gateways to the correlation graph, metrics and trace backends

mod base;
mod fake;
mod http;
mod registry;

pub use base::{Backend, BackendError, BackendRequest, BackendResponse};
pub use fake::{FakeBackend, FakeReply};
pub use http::HttpGateway;
pub use registry::Gateways;
