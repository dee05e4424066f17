//! Ollama (local model server) backends: chat and embeddings.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use meaningcheck_core::traits::{ChatBackend, ChatRequest, ChatResponse, Embedder};

use crate::error::{ensure_embedding_count, ProviderError};
use crate::http::{build_client, read_json};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
const DEFAULT_TIMEOUT_SECS: u64 = 300; // Local models are slower

fn base_or_default(base_url: &str) -> String {
    if base_url.is_empty() {
        DEFAULT_BASE_URL.to_string()
    } else {
        base_url.trim_end_matches('/').to_string()
    }
}

fn send_error(e: reqwest::Error, base_url: &str) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(DEFAULT_TIMEOUT_SECS)
    } else if e.is_connect() {
        ProviderError::Unreachable(format!(
            "Ollama not reachable at {base_url}. Is it running? Start with: ollama serve"
        ))
    } else {
        ProviderError::Unreachable(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Ollama chat backend.
pub struct OllamaChat {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaChat {
    pub fn new(base_url: &str, model: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_or_default(base_url),
            model: model.to_string(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[derive(Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaResponseMessage,
    model: String,
}

#[derive(Deserialize)]
struct OllamaResponseMessage {
    content: String,
}

#[async_trait]
impl ChatBackend for OllamaChat {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };

        let body = OllamaChatRequest {
            model: model.clone(),
            messages: vec![
                OllamaMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                OllamaMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
            stream: false,
            options: OllamaOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, &self.base_url))?;
        let api_response: OllamaChatResponse = read_json(response, &model).await?;

        Ok(ChatResponse {
            content: api_response.message.content,
            model: api_response.model,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

/// Ollama embedding backend (`/api/embed`).
pub struct OllamaEmbedder {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaEmbedder {
    pub fn new(base_url: &str, model: &str) -> anyhow::Result<Self> {
        Ok(Self {
            base_url: base_or_default(base_url),
            model: model.to_string(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[derive(Serialize)]
struct OllamaEmbedRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct OllamaEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    fn name(&self) -> &str {
        "ollama"
    }

    #[instrument(skip(self, texts), fields(model = %self.model, n = texts.len()))]
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/api/embed", self.base_url))
            .json(&OllamaEmbedRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| send_error(e, &self.base_url))?;
        let api_response: OllamaEmbedResponse = read_json(response, &self.model).await?;
        ensure_embedding_count(&api_response.embeddings, texts.len())?;
        Ok(api_response.embeddings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn chat_round_trip() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "message": {"role": "assistant", "content": "88"},
            "model": "qwen2.5:7b"
        });

        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(serde_json::json!({"stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let chat = OllamaChat::new(&server.uri(), "qwen2.5:7b").unwrap();
        let response = chat
            .chat(&ChatRequest {
                model: String::new(),
                system_prompt: "score".into(),
                prompt: "回答: a. 答案: b".into(),
                max_tokens: 800,
                temperature: 0.7,
            })
            .await
            .unwrap();
        assert_eq!(response.content, "88");
        assert_eq!(response.model, "qwen2.5:7b");
    }

    #[tokio::test]
    async fn unknown_model_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "missing-embed").unwrap();
        let err = embedder.embed(&["a".to_string()]).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn embed_returns_vectors_in_order() {
        let server = MockServer::start().await;

        let response_body = serde_json::json!({
            "model": "bge-m3",
            "embeddings": [[0.1, 0.2], [0.3, 0.4]]
        });

        Mock::given(method("POST"))
            .and(path("/api/embed"))
            .and(body_partial_json(serde_json::json!({"input": ["不正常", "反常的"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&response_body))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(&server.uri(), "bge-m3").unwrap();
        let vectors = embedder
            .embed(&["不正常".to_string(), "反常的".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors, vec![vec![0.1, 0.2], vec![0.3, 0.4]]);
    }

    #[test]
    fn empty_base_url_uses_default() {
        assert_eq!(base_or_default(""), DEFAULT_BASE_URL);
        assert_eq!(base_or_default("http://gpu:11434/"), "http://gpu:11434");
    }
}
