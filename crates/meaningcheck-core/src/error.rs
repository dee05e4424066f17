//! Verification error types.
//!
//! Every variant is a caller-visible non-match condition. Nothing here is
//! fatal to the host process: the orchestrator returns these as values and the
//! surrounding handler reports them as "not passed".

use thiserror::Error;

/// Errors that end a single verification call.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum VerifyError {
    /// The answer or the canonical meaning was empty after trimming.
    #[error("empty input: answer and canonical meaning must both be non-empty")]
    EmptyInput,

    /// The canonical meaning produced no candidate senses after splitting.
    #[error("no matchable meaning in canonical answer")]
    NoMatchableMeaning,

    /// A scoring backend failed outright (network, parsing, resources).
    #[error("{backend} backend failure: {message}")]
    BackendFailure { backend: String, message: String },

    /// The remote reply contained no numeric token.
    #[error("no score found in reply: {0}")]
    ScoreParseFailure(String),
}

impl VerifyError {
    pub(crate) fn local(message: impl Into<String>) -> Self {
        VerifyError::BackendFailure {
            backend: "local".into(),
            message: message.into(),
        }
    }

    pub(crate) fn remote(message: impl Into<String>) -> Self {
        VerifyError::BackendFailure {
            backend: "remote".into(),
            message: message.into(),
        }
    }

    /// Returns `true` if the call was rejected before any backend work.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            VerifyError::EmptyInput | VerifyError::NoMatchableMeaning
        )
    }
}

/// Errors raised while loading or persisting the result cache.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Reading or writing the backing file failed.
    #[error("cache I/O error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backing file is not a valid cache document.
    #[error("malformed cache file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
