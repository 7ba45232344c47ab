//! Accumulates port interactions during a run and writes them as a cassette.

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use super::format::{Cassette, Interaction};

/// Collects interactions in call order; [`CassetteRecorder::finish`] writes
/// them to a YAML cassette.
#[derive(Debug)]
pub struct CassetteRecorder {
    path: PathBuf,
    name: String,
    backend: String,
    interactions: Vec<Interaction>,
}

impl CassetteRecorder {
    /// A recorder writing to `path`, labelled with the session `name` and the
    /// `backend` answering the calls.
    pub fn new(
        path: impl Into<PathBuf>,
        name: impl Into<String>,
        backend: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            backend: backend.into(),
            interactions: Vec::new(),
        }
    }

    /// Where the cassette will be written.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a raw interaction; `seq` is its position in the run.
    pub fn record(&mut self, port: &str, method: &str, input: Value, output: Value) {
        let seq = self.interactions.len() as u64;
        self.interactions.push(Interaction {
            seq,
            port: port.to_string(),
            method: method.to_string(),
            input,
            output,
        });
    }

    /// Appends a fallible call, storing `Ok(v)` as `{"Ok": v}` and `Err(e)`
    /// as `{"Err": e}` so replay can rebuild the same variant.
    ///
    /// # Errors
    ///
    /// Returns the serialization error, recording nothing, when the input or
    /// result cannot be represented as JSON.
    pub fn record_result<I, T, E>(
        &mut self,
        port: &str,
        method: &str,
        input: &I,
        result: &Result<T, E>,
    ) -> Result<(), serde_json::Error>
    where
        I: Serialize,
        T: Serialize,
        E: Serialize,
    {
        let output = match result {
            Ok(value) => json!({ "Ok": serde_json::to_value(value)? }),
            Err(err) => json!({ "Err": serde_json::to_value(err)? }),
        };
        let input = serde_json::to_value(input)?;
        self.record(port, method, input, output);
        Ok(())
    }

    /// Number of interactions recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    /// Writes everything recorded so far, creating parent directories.
    ///
    /// Each call rewrites the whole file, so it is safe to call more than once.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML cannot be produced or written.
    pub fn finish(&self) -> Result<PathBuf, std::io::Error> {
        let cassette = Cassette {
            name: self.name.clone(),
            recorded_at: Utc::now(),
            backend: self.backend.clone(),
            interactions: self.interactions.clone(),
        };
        let yaml = serde_yaml::to_string(&cassette).map_err(std::io::Error::other)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, yaml)?;
        Ok(self.path.clone())
    }
}
