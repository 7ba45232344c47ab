//! Cassette format for recording and replaying LLM interactions.

pub mod format;
pub mod recorder;
pub mod replayer;
