//! Top-level answer verification.
//!
//! A call moves through `cache lookup -> (hit: return) | (miss: local fan-out
//! and remote score in parallel -> min -> cache write -> return)`. Failures are
//! terminal per call and never retried here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, Instrument};

use crate::cache::ResultCache;
use crate::error::VerifyError;
use crate::fanout::FanOutScorer;
use crate::scorer::RemoteScorer;

/// Default pass mark on the 0-100 scale.
pub const DEFAULT_PASS_THRESHOLD: f64 = 80.0;

/// Caller-facing result of a verification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    /// Combined score, or `None` for a non-match condition.
    pub similarity: Option<f64>,
    /// Whether the score reached the pass threshold.
    pub passed: bool,
    /// Why no score was produced.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl Verdict {
    /// Build a verdict from a verification outcome.
    pub fn from_outcome(outcome: &Result<f64, VerifyError>, threshold: f64) -> Self {
        match outcome {
            Ok(score) => Self {
                similarity: Some(*score),
                passed: *score >= threshold,
                reason: None,
            },
            Err(e) => Self {
                similarity: None,
                passed: false,
                reason: Some(e.to_string()),
            },
        }
    }
}

/// Conservative combination: both signals must agree.
pub fn combine_scores(local: f64, remote: f64) -> f64 {
    local.min(remote)
}

/// Verification orchestrator. Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct Verifier {
    local: FanOutScorer,
    remote: RemoteScorer,
    cache: Arc<ResultCache>,
}

impl Verifier {
    pub fn new(local: FanOutScorer, remote: RemoteScorer, cache: Arc<ResultCache>) -> Self {
        Self {
            local,
            remote,
            cache,
        }
    }

    pub fn cache(&self) -> &Arc<ResultCache> {
        &self.cache
    }

    /// Combined 0-100 score for `answer` against `canonical`.
    pub async fn verify(&self, answer: &str, canonical: &str) -> Result<f64, VerifyError> {
        if answer.trim().is_empty() || canonical.trim().is_empty() {
            return Err(VerifyError::EmptyInput);
        }

        let span = info_span!("verify", answer = %answer.trim());
        self.verify_inner(answer, canonical).instrument(span).await
    }

    async fn verify_inner(&self, answer: &str, canonical: &str) -> Result<f64, VerifyError> {
        if let Some(score) = self.cache.get(answer, canonical).await {
            debug!(score, "cache hit");
            return Ok(score);
        }

        let (local, remote) = tokio::join!(
            self.local.score_against_all(answer, canonical),
            self.remote.score(answer, canonical),
        );
        debug!(?local, ?remote, "scoring branches finished");

        let score = combine_scores(local?, remote?);
        info!(
            score,
            local_backend = self.local.backend_name(),
            remote_backend = self.remote.backend_name(),
            "combined score"
        );

        if let Err(e) = self.cache.put(answer, canonical, score).await {
            error!("failed to persist cached score: {e}");
        }

        Ok(score)
    }

    /// Verify and compare against `threshold`.
    pub async fn check(&self, answer: &str, canonical: &str, threshold: f64) -> Verdict {
        Verdict::from_outcome(&self.verify(answer, canonical).await, threshold)
    }
}
