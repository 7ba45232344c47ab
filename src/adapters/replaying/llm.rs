//! Replaying adapter for the `LlmClient` port.

use std::sync::Mutex;

use super::{decode_result, next_output};
use crate::cassette::replayer::CassetteReplayer;
use crate::ports::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmFuture};

/// Serves recorded LLM completions from a cassette.
pub struct ReplayingLlmClient {
    replayer: Mutex<CassetteReplayer>,
}

impl ReplayingLlmClient {
    /// Create a replaying LLM client backed by the given replayer.
    #[must_use]
    pub fn new(replayer: CassetteReplayer) -> Self {
        Self { replayer: Mutex::new(replayer) }
    }
}

impl LlmClient for ReplayingLlmClient {
    fn complete(&self, _request: &CompletionRequest) -> LlmFuture<'_> {
        let output = next_output(&self.replayer, "llm", "complete");
        let result: Result<CompletionResponse, LlmError> =
            decode_result(&output, "llm::complete", LlmError::InvalidResponse);
        Box::pin(async move { result })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    fn replaying(outputs: Vec<serde_json::Value>) -> ReplayingLlmClient {
        let interactions = outputs
            .into_iter()
            .enumerate()
            .map(|(seq, output)| Interaction {
                seq: seq as u64,
                port: "llm".into(),
                method: "complete".into(),
                input: json!({}),
                output,
            })
            .collect();
        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            backend: "test".into(),
            interactions,
        };
        ReplayingLlmClient::new(CassetteReplayer::new(&cassette))
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "m".into(),
            prompt: "p".into(),
            max_tokens: 1,
            temperature: 0.0,
            top_p: 1.0,
        }
    }

    #[tokio::test]
    async fn replays_ok_and_typed_err() {
        let llm = replaying(vec![
            json!({"Ok": {"text": "Does foo.", "prompt_tokens": 3, "completion_tokens": 4}}),
            json!({"Err": {"Timeout": "took too long"}}),
        ]);

        let response = llm.complete(&request()).await.unwrap();
        assert_eq!(response.text, "Does foo.");
        assert_eq!(response.completion_tokens, 4);

        let err = llm.complete(&request()).await.unwrap_err();
        assert_eq!(err, LlmError::Timeout("took too long".into()));
    }

    #[tokio::test]
    async fn plain_string_err_becomes_invalid_response() {
        let llm = replaying(vec![json!({"Err": "backend exploded"})]);
        let err = llm.complete(&request()).await.unwrap_err();
        assert_eq!(err, LlmError::InvalidResponse("backend exploded".into()));
    }

    #[tokio::test]
    async fn malformed_ok_is_reported() {
        let llm = replaying(vec![json!({"Ok": {"unexpected": true}})]);
        let err = llm.complete(&request()).await.unwrap_err();
        assert!(err.to_string().contains("llm::complete"));
    }
}
