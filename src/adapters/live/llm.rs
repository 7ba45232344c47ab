//! Live adapter for the `LlmClient` port using the Ollama chat API.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::OllamaConfig;
use crate::ports::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError, LlmFuture};

/// Live LLM client that calls a local or remote Ollama server.
pub struct OllamaLlmClient {
    client: Client,
    chat_url: String,
}

impl OllamaLlmClient {
    /// Creates a client for the server named in `config`.
    #[must_use]
    pub fn new(config: &OllamaConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("failed to configure HTTP client: {e}, using defaults");
                Client::new()
            });
        Self { client, chat_url: chat_url(&config.ollama_server) }
    }
}

fn chat_url(server: &str) -> String {
    format!("{}/api/chat", server.trim_end_matches('/'))
}

/// Request body sent to `/api/chat`.
#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    stream: bool,
    options: ChatOptions,
}

/// A single message in the chat request.
#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

/// Sampling options understood by Ollama.
#[derive(Serialize)]
struct ChatOptions {
    temperature: f32,
    top_p: f32,
    num_predict: u32,
}

/// Non-streaming response from `/api/chat`.
#[derive(Deserialize)]
struct ChatResponse {
    message: ResponseMessage,
    #[serde(default)]
    prompt_eval_count: u32,
    #[serde(default)]
    eval_count: u32,
}

/// The assistant message inside a chat response.
#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: String,
}

/// Error body returned by Ollama.
#[derive(Deserialize)]
struct OllamaError {
    error: String,
}

fn transport_error(e: &reqwest::Error) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(e.to_string())
    } else {
        LlmError::Transport(e.to_string())
    }
}

fn parse_response(status: u16, body: &str) -> Result<CompletionResponse, LlmError> {
    if !(200..300).contains(&status) {
        let message =
            serde_json::from_str::<OllamaError>(body).map_or_else(|_| body.to_string(), |e| e.error);
        return Err(LlmError::Status { status, message });
    }

    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::InvalidResponse(format!("failed to parse Ollama response: {e}")))?;

    Ok(CompletionResponse {
        text: response.message.content,
        prompt_tokens: response.prompt_eval_count,
        completion_tokens: response.eval_count,
    })
}

impl LlmClient for OllamaLlmClient {
    fn complete(&self, request: &CompletionRequest) -> LlmFuture<'_> {
        let request = request.clone();

        Box::pin(async move {
            let body = ChatRequest {
                model: &request.model,
                messages: vec![ChatMessage { role: "user", content: &request.prompt }],
                stream: false,
                options: ChatOptions {
                    temperature: request.temperature,
                    top_p: request.top_p,
                    num_predict: request.max_tokens,
                },
            };

            tracing::debug!(url = %self.chat_url, model = %request.model, "sending chat request");
            let response = self
                .client
                .post(&self.chat_url)
                .json(&body)
                .send()
                .await
                .map_err(|e| transport_error(&e))?;

            let status = response.status().as_u16();
            let text = response.text().await.map_err(|e| transport_error(&e))?;
            parse_response(status, &text)
        })
    }
}
