//! Replaying adapters that replay recorded interactions.

pub mod llm;

pub use llm::ReplayingLlmClient;

use std::sync::{Mutex, PoisonError};

use serde::de::DeserializeOwned;

use crate::cassette::replayer::CassetteReplayer;

/// Pull the next recorded output for `port`/`method`.
pub(crate) fn next_output(
    replayer: &Mutex<CassetteReplayer>,
    port: &str,
    method: &str,
) -> serde_json::Value {
    let mut replayer = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    replayer.next_interaction(port, method).output
}

/// Decode a recorded `{"Ok": v}` / `{"Err": e}` output.
///
/// Mirror of `recording::record_result`. An output without either key is
/// treated as a bare `Ok` value. `Err` payloads that do not deserialize as
/// `E` (hand-written cassettes often use a plain message) go through
/// `fallback_err`, as do `Ok` payloads that do not deserialize as `T`.
pub(crate) fn decode_result<T, E>(
    output: &serde_json::Value,
    context: &str,
    fallback_err: impl Fn(String) -> E,
) -> Result<T, E>
where
    T: DeserializeOwned,
    E: DeserializeOwned,
{
    if let Some(err) = output.get("Err") {
        return Err(serde_json::from_value(err.clone()).unwrap_or_else(|_| {
            fallback_err(err.as_str().map_or_else(|| err.to_string(), str::to_string))
        }));
    }
    let value = output.get("Ok").unwrap_or(output);
    serde_json::from_value(value.clone())
        .map_err(|e| fallback_err(format!("{context}: failed to deserialize recorded output: {e}")))
}
