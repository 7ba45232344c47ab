//! Recording adapter for the `LlmClient` port.

use std::sync::{Arc, Mutex};

use super::record_result;
use crate::cassette::recorder::CassetteRecorder;
use crate::ports::{CompletionRequest, LlmClient, LlmFuture};

/// Records LLM interactions while delegating to an inner implementation.
pub struct RecordingLlmClient {
    inner: Box<dyn LlmClient>,
    recorder: Arc<Mutex<CassetteRecorder>>,
}

impl RecordingLlmClient {
    /// Creates a new recording LLM client wrapping the given implementation.
    pub fn new(inner: Box<dyn LlmClient>, recorder: Arc<Mutex<CassetteRecorder>>) -> Self {
        Self { inner, recorder }
    }
}

impl LlmClient for RecordingLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let result = self.inner.complete(&request).await;
            record_result(&self.recorder, "llm", "complete", &request, &result);
            result
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::replaying::ReplayingLlmClient;
    use crate::cassette::format::{Cassette, Interaction};
    use crate::cassette::replayer::CassetteReplayer;
    use crate::ports::LlmError;
    use chrono::Utc;
    use serde_json::json;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest {
            model: "codellama:7b".into(),
            prompt: prompt.into(),
            max_tokens: 64,
            temperature: 0.5,
            top_p: 0.9,
        }
    }

    #[tokio::test]
    async fn records_successes_and_failures() {
        let source = Cassette {
            name: "source".into(),
            recorded_at: Utc::now(),
            backend: "test".into(),
            interactions: vec![
                Interaction {
                    seq: 0,
                    port: "llm".into(),
                    method: "complete".into(),
                    input: json!({}),
                    output: json!({"Ok": {"text": "Does foo.", "prompt_tokens": 1, "completion_tokens": 2}}),
                },
                Interaction {
                    seq: 1,
                    port: "llm".into(),
                    method: "complete".into(),
                    input: json!({}),
                    output: json!({"Err": {"Status": {"status": 500, "message": "boom"}}}),
                },
            ],
        };
        let inner = ReplayingLlmClient::new(CassetteReplayer::new(&source));

        let path = std::env::temp_dir().join("docfill_recording_llm.cassette.yaml");
        let recorder = Arc::new(Mutex::new(CassetteRecorder::new(&path, "rec", "test")));

        let llm = RecordingLlmClient::new(Box::new(inner), Arc::clone(&recorder));
        assert_eq!(llm.complete(&request("foo")).await.unwrap().text, "Does foo.");
        assert!(matches!(
            llm.complete(&request("bar")).await,
            Err(LlmError::Status { status: 500, .. })
        ));

        recorder.lock().unwrap().finish().unwrap();

        let cassette = Cassette::load(&path).unwrap();
        assert_eq!(cassette.interactions.len(), 2);
        assert_eq!(cassette.interactions[0].input["prompt"], json!("foo"));
        assert_eq!(cassette.interactions[0].output["Ok"]["text"], json!("Does foo."));
        assert_eq!(cassette.interactions[1].output["Err"]["Status"]["status"], json!(500));

        let _ = std::fs::remove_file(&path);
    }
}
