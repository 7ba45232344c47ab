//! Recording adapters that capture interactions to cassettes.

pub mod llm;

pub use llm::RecordingLlmClient;

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::cassette::recorder::CassetteRecorder;

/// Record a fallible call on the shared recorder.
///
/// Mirror of `replaying::decode_result`. A call that cannot be serialized is
/// logged and left out of the cassette; the call being recorded still
/// succeeds.
pub(crate) fn record_result<I, T, E>(
    recorder: &Arc<Mutex<CassetteRecorder>>,
    port: &str,
    method: &str,
    input: &I,
    result: &Result<T, E>,
) where
    I: Serialize,
    T: Serialize,
    E: Serialize,
{
    let mut recorder = recorder.lock().unwrap_or_else(PoisonError::into_inner);
    if let Err(e) = recorder.record_result(port, method, input, result) {
        tracing::warn!(port, method, "failed to serialize interaction for recording: {e}");
    }
}
