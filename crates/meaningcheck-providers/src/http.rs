//! HTTP plumbing shared by every backend.

use std::time::Duration;

use anyhow::Context;
use serde::de::DeserializeOwned;

use crate::error::ProviderError;

/// Build a client with a whole-request timeout.
pub(crate) fn build_client(timeout_secs: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("meaningcheck/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

/// Classify a transport error.
pub(crate) fn send_error(e: reqwest::Error, timeout_secs: u64) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout_secs)
    } else {
        ProviderError::Unreachable(e.to_string())
    }
}

/// Map non-success statuses to [`ProviderError`] and decode the JSON body.
pub(crate) async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    model: &str,
) -> Result<T, ProviderError> {
    let status = response.status().as_u16();
    if status == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(5)
            * 1000;
        return Err(ProviderError::RateLimited {
            retry_after_ms: retry_after,
        });
    }
    if status == 401 {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::AuthenticationFailed(body));
    }
    if status == 404 {
        return Err(ProviderError::ModelNotFound(model.to_string()));
    }
    if status >= 400 {
        let body = response.text().await.unwrap_or_default();
        return Err(ProviderError::Status { status, body });
    }

    response
        .json::<T>()
        .await
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
}
