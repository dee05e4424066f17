//! Errors raised by chat and embedding backends.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    /// HTTP 429. `retry_after_ms` comes from the `retry-after` header.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// HTTP 401, usually a bad or missing API key.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// HTTP 404. Holds the model or Azure deployment name.
    #[error("model not found: {0}")]
    ModelNotFound(String),

    /// Any other non-success status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body was not the JSON shape the backend documents.
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// An embeddings call returned a different number of vectors than inputs.
    #[error("expected {expected} embeddings, got {actual}")]
    EmbeddingCountMismatch { expected: usize, actual: usize },

    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connection refused, DNS failure and other transport errors.
    #[error("backend unreachable: {0}")]
    Unreachable(String),
}

/// Check that an embeddings reply has one vector per input.
pub(crate) fn ensure_embedding_count(
    vectors: &[Vec<f32>],
    expected: usize,
) -> Result<(), ProviderError> {
    if vectors.len() == expected {
        Ok(())
    } else {
        Err(ProviderError::EmbeddingCountMismatch {
            expected,
            actual: vectors.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_count_is_checked() {
        let vectors = vec![vec![0.1, 0.2]];
        assert!(ensure_embedding_count(&vectors, 1).is_ok());
        let err = ensure_embedding_count(&vectors, 2).unwrap_err();
        assert_eq!(err.to_string(), "expected 2 embeddings, got 1");
    }
}
