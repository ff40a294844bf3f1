//! Prompt construction, LLM invocation and defensive response parsing

mod client;
mod error;
mod fallback;
mod parse;
mod pipeline;
mod prompt;

pub use client::{FakeLlmClient, HttpLlmClient, LlmClient};
pub use error::LlmError;
pub use fallback::fallback_analysis;
pub use parse::{find_json_object, parse_response};
pub use pipeline::{PromptPipeline, SummaryRequest};
pub use prompt::{build_prompt, ResponseSchema};
