//! Turning definitions into generated docstring text.
//!
//! Backend selection is a closed enum resolved once per run. Each request
//! produces an explicit [`GenerationOutcome`]; callers decide what a failure
//! means instead of receiving a silently empty string.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::config::OllamaConfig;
use crate::ports::llm::{CompletionRequest, LlmClient};
use crate::syntax::DefinitionKind;

/// Text-generation backends known by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    /// A local or remote Ollama server.
    Ollama,
    /// Any other name; rejected before a run starts.
    Unsupported(String),
}

impl Backend {
    /// The backend name as given on the command line.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Ollama => "ollama",
            Self::Unsupported(name) => name,
        }
    }
}

impl FromStr for Backend {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "ollama" => Self::Ollama,
            _ => Self::Unsupported(s.to_string()),
        })
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the generator needs to know about one definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationRequest<'a> {
    /// Identifier of the definition.
    pub name: &'a str,
    /// Function or class.
    pub kind: DefinitionKind,
    /// The definition's own source code.
    pub snippet: &'a str,
}

/// The result of one generation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationOutcome {
    /// The backend produced text (not yet sanitized).
    Generated(String),
    /// The attempt failed in a way that retrying will not fix.
    Skip {
        /// Why the definition could not be documented.
        reason: String,
    },
    /// The attempt failed in a way that may succeed if sent again.
    Retry {
        /// What went wrong this time.
        reason: String,
    },
}

/// What to do with a definition whose generation ultimately failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FailurePolicy {
    /// Leave the definition undocumented.
    #[default]
    Skip,
    /// Insert an empty docstring anyway.
    InsertEmpty,
}

/// Builds prompts and maps completion results to outcomes.
pub struct DocGenerator<'a> {
    llm: &'a dyn LlmClient,
    config: &'a OllamaConfig,
}

impl<'a> DocGenerator<'a> {
    /// Creates a generator that sends requests through `llm`.
    #[must_use]
    pub fn new(llm: &'a dyn LlmClient, config: &'a OllamaConfig) -> Self {
        Self { llm, config }
    }

    /// Makes one generation attempt for `request`.
    pub async fn generate(&self, request: &GenerationRequest<'_>) -> GenerationOutcome {
        let completion = CompletionRequest {
            model: self.config.model.clone(),
            prompt: build_prompt(request),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            top_p: self.config.top_p,
        };

        match self.llm.complete(&completion).await {
            Ok(response) => {
                tracing::debug!(
                    name = request.name,
                    prompt_tokens = response.prompt_tokens,
                    completion_tokens = response.completion_tokens,
                    "generated docstring"
                );
                GenerationOutcome::Generated(response.text)
            }
            Err(e) if e.is_retryable() => GenerationOutcome::Retry { reason: e.to_string() },
            Err(e) => GenerationOutcome::Skip { reason: e.to_string() },
        }
    }
}

/// The prompt sent for one definition.
#[must_use]
pub fn build_prompt(request: &GenerationRequest<'_>) -> String {
    format!(
        "You are a senior Python developer. \
         Generate a concise and descriptive docstring for the following {kind} named '{name}'. \
         Use standard Python docstring conventions.\n\n{snippet}",
        kind = request.kind,
        name = request.name,
        snippet = request.snippet,
    )
}
