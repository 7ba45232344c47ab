//! Backend settings loaded from JSON and the environment.

use std::env;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Settings file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "ollama_config.json";

/// Overrides [`OllamaConfig::ollama_server`].
pub const SERVER_ENV: &str = "DOCFILL_OLLAMA_SERVER";
/// Overrides [`OllamaConfig::model`].
pub const MODEL_ENV: &str = "DOCFILL_MODEL";

/// Connection and sampling settings for the Ollama backend.
///
/// Every field is optional in the JSON file; missing ones take the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server.
    pub ollama_server: String,
    /// Model used for every request.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Maximum number of tokens to generate (`num_predict`).
    pub max_tokens: u32,
    /// Nucleus sampling cutoff.
    pub top_p: f32,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            ollama_server: "http://localhost:11434".to_string(),
            model: "codellama:7b".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
            top_p: 0.9,
            timeout_secs: 120,
        }
    }
}

impl OllamaConfig {
    /// Loads settings from `path` (or [`DEFAULT_CONFIG_FILE`]), then applies
    /// environment overrides.
    ///
    /// A missing file means defaults. An unreadable or malformed file is
    /// logged and also falls back to defaults rather than aborting the run.
    #[must_use]
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
        let mut config = match std::fs::read_to_string(path) {
            Ok(content) => Self::from_json(&content).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), "failed to parse config: {e}, using defaults");
                Self::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "failed to read config: {e}, using defaults");
                Self::default()
            }
        };
        config.apply_overrides(env::var(SERVER_ENV).ok(), env::var(MODEL_ENV).ok());
        config
    }

    /// Parses settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error for malformed JSON or mistyped fields.
    pub fn from_json(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }

    fn apply_overrides(&mut self, server: Option<String>, model: Option<String>) {
        if let Some(server) = server.filter(|s| !s.trim().is_empty()) {
            self.ollama_server = server;
        }
        if let Some(model) = model.filter(|m| !m.trim().is_empty()) {
            self.model = model;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let config = OllamaConfig::from_json(r#"{"model": "llama3", "temperature": 0.2}"#).unwrap();
        assert_eq!(config.model, "llama3");
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(config.ollama_server, "http://localhost:11434");
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(OllamaConfig::from_json("{not json").is_err());
        assert!(OllamaConfig::from_json(r#"{"max_tokens": "lots"}"#).is_err());
    }

    #[test]
    fn missing_file_uses_defaults() {
        let path = std::env::temp_dir().join("docfill_config_test_missing.json");
        let _ = std::fs::remove_file(&path);
        let config = OllamaConfig::load(Some(&path));
        assert_eq!(config.max_tokens, OllamaConfig::default().max_tokens);
        assert_eq!(config.timeout_secs, 120);
    }

    #[test]
    fn malformed_file_uses_defaults() {
        let dir = std::env::temp_dir().join("docfill_config_test_malformed");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("ollama_config.json");
        std::fs::write(&path, "{ broken").unwrap();

        let config = OllamaConfig::load(Some(&path));
        assert_eq!(config.max_tokens, 1024);

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn blank_overrides_are_ignored() {
        let mut config = OllamaConfig::default();
        config.apply_overrides(Some("http://gpu-box:11434".into()), Some("  ".into()));
        assert_eq!(config.ollama_server, "http://gpu-box:11434");
        assert_eq!(config.model, "codellama:7b");
    }
}
