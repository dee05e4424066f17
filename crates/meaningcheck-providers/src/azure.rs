//! Azure OpenAI chat backend.
//!
//! The deployment name is part of the URL, so the request body carries no
//! model.

use std::time::Instant;

use async_trait::async_trait;
use tracing::instrument;

use meaningcheck_core::traits::{ChatBackend, ChatRequest, ChatResponse};

use crate::http::{build_client, read_json, send_error};
use crate::openai::{ChatCompletionRequest, ChatCompletionResponse};

pub const DEFAULT_API_VERSION: &str = "2024-02-15-preview";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Azure-hosted OpenAI deployment.
pub struct AzureOpenAiChat {
    api_key: String,
    deployment: String,
    url: String,
    client: reqwest::Client,
}

impl AzureOpenAiChat {
    pub fn new(
        api_key: &str,
        endpoint: &str,
        deployment: &str,
        api_version: Option<&str>,
    ) -> anyhow::Result<Self> {
        anyhow::ensure!(!endpoint.trim().is_empty(), "azure endpoint must be set");
        anyhow::ensure!(
            !deployment.trim().is_empty(),
            "azure deployment name must be set"
        );

        let url = format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            endpoint.trim_end_matches('/'),
            deployment,
            api_version.unwrap_or(DEFAULT_API_VERSION)
        );

        Ok(Self {
            api_key: api_key.to_string(),
            deployment: deployment.to_string(),
            url,
            client: build_client(DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChatBackend for AzureOpenAiChat {
    fn name(&self) -> &str {
        "azure"
    }

    #[instrument(skip(self, request), fields(deployment = %self.deployment))]
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        let start = Instant::now();
        let body = ChatCompletionRequest::from_request(request, None);

        let response = self
            .client
            .post(&self.url)
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, DEFAULT_TIMEOUT_SECS))?;
        let api_response: ChatCompletionResponse = read_json(response, &self.deployment).await?;

        Ok(ChatResponse {
            content: api_response.first_content(),
            model: api_response
                .model
                .unwrap_or_else(|| self.deployment.clone()),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }
}
