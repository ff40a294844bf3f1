//! LLM call failures. All of them end in a fallback result.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LlmError {
    #[error("LLM unavailable: {0}")]
    Unavailable(String),
    #[error("LLM timed out after {0}s")]
    Timeout(u64),
    #[error("LLM endpoint returned HTTP {0}")]
    HttpStatus(u16),
    #[error("LLM returned no completion text")]
    EmptyResponse,
    #[error("malformed LLM response: {0}")]
    Malformed(String),
}
