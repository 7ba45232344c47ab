//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the annotation core and an
//! external system (the text-generation backend, the filesystem).
//! Implementations live in `src/adapters/`.

pub mod filesystem;
pub mod llm;

pub use filesystem::FileSystem;
pub use llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmFuture};
