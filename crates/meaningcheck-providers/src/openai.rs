//! OpenAI API backends: chat completions and embeddings.

use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use meaningcheck_core::traits::{ChatBackend, ChatRequest, ChatResponse, Embedder};

use crate::error::ensure_embedding_count;
use crate::http::{build_client, read_json, send_error};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Request body shared with Azure OpenAI, which omits `model`.
#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub max_tokens: u32,
    pub temperature: f64,
    pub messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
    #[serde(default)]
    pub model: Option<String>,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoice {
    pub message: ChatChoiceMessage,
}

#[derive(Deserialize)]
pub(crate) struct ChatChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionRequest {
    pub(crate) fn from_request(request: &ChatRequest, model: Option<String>) -> Self {
        Self {
            model,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: request.prompt.clone(),
                },
            ],
        }
    }
}

impl ChatCompletionResponse {
    pub(crate) fn first_content(&self) -> String {
        self.choices
            .iter()
            .find_map(|c| c.message.content.clone())
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// OpenAI-compatible chat backend.
pub struct OpenAiChat {
    api_key: String,
    base_url: String,
    model: String,
    org_id: Option<String>,
    client: reqwest::Client,
}

impl OpenAiChat {
    pub fn new(
        api_key: &str,
        model: &str,
        base_url: Option<String>,
        org_id: Option<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.to_string(),
            org_id,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[async_trait]
impl ChatBackend for OpenAiChat {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model))]
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let model = if request.model.is_empty() {
            self.model.clone()
        } else {
            request.model.clone()
        };
        let body = ChatCompletionRequest::from_request(request, Some(model.clone()));

        let mut req = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key));

        if let Some(org) = &self.org_id {
            req = req.header("OpenAI-Organization", org);
        }

        let response = req
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let api_response: ChatCompletionResponse = read_json(response, &model).await?;

        Ok(ChatResponse {
            content: api_response.first_content(),
            model: api_response.model.unwrap_or(model),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

/// OpenAI embeddings backend.
pub struct OpenAiEmbedder {
    api_key: String,
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, model: &str, base_url: Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: model.to_string(),
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    #[serde(default)]
    index: usize,
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, texts), fields(model = %self.model, n = texts.len()))]
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&EmbeddingRequest {
                model: &self.model,
                input: texts,
            })
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let mut api_response: EmbeddingResponse = read_json(response, &self.model).await?;

        api_response.data.sort_by_key(|d| d.index);
        let vectors: Vec<Vec<f32>> = api_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect();
        ensure_embedding_count(&vectors, texts.len())?;
        Ok(vectors)
    }
}
