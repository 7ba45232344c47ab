//! Service context bundling the port trait objects for one run.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use crate::adapters::live::{LiveFileSystem, OllamaLlmClient};
use crate::adapters::recording::RecordingLlmClient;
use crate::adapters::replaying::ReplayingLlmClient;
use crate::cassette::recorder::CassetteRecorder;
use crate::cassette::replayer::CassetteReplayer;
use crate::config::OllamaConfig;
use crate::error::DocfillError;
use crate::generate::Backend;
use crate::ports::{FileSystem, LlmClient};

/// Records every LLM interaction of the run into this cassette file.
pub const RECORD_ENV: &str = "DOCFILL_RECORD";
/// Serves LLM responses from this cassette file instead of the network.
pub const REPLAY_ENV: &str = "DOCFILL_REPLAY";

/// Bundles the port trait objects into a single context.
///
/// Constructors wire up different adapter implementations (live, replaying,
/// recording). The filesystem is always live outside of unit tests; only
/// the LLM boundary is recorded or replayed.
pub struct ServiceContext {
    /// Filesystem for enumerating, reading and writing source files.
    pub fs: Box<dyn FileSystem>,
    /// LLM client for docstring generation.
    pub llm: Box<dyn LlmClient>,
    /// Optional cassette recorder; written to disk on drop.
    recorder: Option<Arc<Mutex<CassetteRecorder>>>,
}

impl ServiceContext {
    /// Creates a live context talking to the configured Ollama server.
    #[must_use]
    pub fn live(config: &OllamaConfig) -> Self {
        Self::with_adapters(Box::new(LiveFileSystem), Box::new(OllamaLlmClient::new(config)))
    }

    /// Creates a live context that also writes a cassette to `path` on drop.
    #[must_use]
    pub fn recording(config: &OllamaConfig, path: &Path) -> Self {
        let backend = format!("ollama/{}", config.model);
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(path, "docfill-session", backend)));
        let llm =
            RecordingLlmClient::new(Box::new(OllamaLlmClient::new(config)), Arc::clone(&recorder));
        Self { fs: Box::new(LiveFileSystem), llm: Box::new(llm), recorder: Some(recorder) }
    }

    /// Creates a context whose LLM answers come from the cassette at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the cassette file cannot be read or parsed.
    pub fn replaying(path: &Path) -> Result<Self, DocfillError> {
        let replayer = CassetteReplayer::from_path(path).map_err(DocfillError::Cassette)?;
        Ok(Self::with_adapters(Box::new(LiveFileSystem), Box::new(ReplayingLlmClient::new(replayer))))
    }

    /// Creates a context from explicit adapters.
    #[must_use]
    pub fn with_adapters(fs: Box<dyn FileSystem>, llm: Box<dyn LlmClient>) -> Self {
        Self { fs, llm, recorder: None }
    }

    /// Picks adapters for `backend`, honouring [`REPLAY_ENV`] and
    /// [`RECORD_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`DocfillError::UnsupportedBackend`] before anything else is
    /// looked at, or a cassette error when the replay file is unusable.
    pub fn from_env(backend: &Backend, config: &OllamaConfig) -> Result<Self, DocfillError> {
        if let Backend::Unsupported(name) = backend {
            return Err(DocfillError::UnsupportedBackend(name.clone()));
        }

        if let Some(path) = env_path(REPLAY_ENV) {
            tracing::info!(cassette = %path, "replaying LLM responses");
            return Self::replaying(Path::new(&path));
        }
        if let Some(path) = env_path(RECORD_ENV) {
            tracing::info!(cassette = %path, "recording LLM responses");
            return Ok(Self::recording(config, Path::new(&path)));
        }
        Ok(Self::live(config))
    }
}

fn env_path(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Drop for ServiceContext {
    fn drop(&mut self) {
        if let Some(recorder) = self.recorder.take() {
            let recorder = recorder.lock().unwrap_or_else(PoisonError::into_inner);
            match recorder.finish() {
                Ok(path) => tracing::info!(
                    path = %path.display(),
                    interactions = recorder.len(),
                    "cassette written"
                ),
                Err(e) => eprintln!("Warning: failed to write cassette: {e}"),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::ports::CompletionRequest;
    use chrono::Utc;
    use serde_json::json;

    fn write_cassette(path: &Path, interactions: Vec<Interaction>) {
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            backend: "ollama/test".into(),
            interactions,
        };
        let yaml = serde_yaml::to_string(&cassette).unwrap();
        std::fs::write(path, yaml).unwrap();
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            prompt: "p".into(),
            max_tokens: 8,
            temperature: 0.1,
            top_p: 0.9,
        }
    }

    #[tokio::test]
    async fn replaying_context_serves_cassette() {
        let dir = std::env::temp_dir().join("docfill_ctx_test_replay");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("run.cassette.yaml");
        write_cassette(
            &path,
            vec![Interaction {
                seq: 0,
                port: "llm".into(),
                method: "complete".into(),
                input: json!({}),
                output: json!({"Ok": {"text": "Replayed."}}),
            }],
        );

        let ctx = ServiceContext::replaying(&path).unwrap();
        assert_eq!(ctx.llm.complete(&request()).await.unwrap().text, "Replayed.");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_cassette_is_an_error() {
        let path = std::env::temp_dir().join("docfill_ctx_no_such.cassette.yaml");
        let err = ServiceContext::replaying(&path).err().unwrap();
        assert!(matches!(err, DocfillError::Cassette(_)));
    }

    #[test]
    fn recording_context_writes_cassette_on_drop() {
        let dir = std::env::temp_dir().join("docfill_ctx_test_record");
        let _ = std::fs::remove_dir_all(&dir);
        let path = dir.join("out.cassette.yaml");

        drop(ServiceContext::recording(&OllamaConfig::default(), &path));

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.backend, "ollama/codellama:7b");
        assert!(cassette.interactions.is_empty());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn unsupported_backend_is_rejected_first() {
        let err = ServiceContext::from_env(&Backend::Unsupported("gpt".into()), &OllamaConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "LLM backend 'gpt' is not supported yet");
    }
}
