//! Adapters implementing the port traits.
//!
//! - `live` talks to the real filesystem and the Ollama server.
//! - `recording` wraps a live adapter and captures interactions to a cassette.
//! - `replaying` serves previously recorded interactions.

pub mod live;
pub mod recording;
pub mod replaying;
