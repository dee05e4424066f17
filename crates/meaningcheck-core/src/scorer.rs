//! Single-call scorers wrapping the local and remote backends.
//!
//! Both produce a score on the 0-100 scale. Neither retries.

use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, instrument, warn};

use crate::error::VerifyError;
use crate::traits::{ChatBackend, ChatRequest, SimilarityBackend};

/// Upper bound of every score.
pub const MAX_SCORE: f64 = 100.0;

/// Instruction sent with every remote scoring request.
pub const REMOTE_SYSTEM_PROMPT: &str = "请比较一下如下中文回答和答案的意思,回答以 '回答:'开始，以'.'结束， 答案以'答案:' 开始, 后面的都是答案。的语义相似度，一模一样就是100分，完全不一样就是0分，请根据语义相似性给出分数。答案可能包含多个意思，用','或者';'分隔。如果回答跟答案中某一个意思相似，也请给出90分以上的分数。";

static SCORE_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[-+]?\d*\.?\d+").expect("score token pattern is valid")
});

// ---------------------------------------------------------------------------
// Local scorer
// ---------------------------------------------------------------------------

/// Scores an answer against one sense using the shared similarity backend.
#[derive(Clone)]
pub struct LocalScorer {
    backend: Arc<dyn SimilarityBackend>,
}

impl LocalScorer {
    pub fn new(backend: Arc<dyn SimilarityBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Similarity of `answer` and `meaning`, both trimmed, scaled to 0-100.
    pub async fn score(&self, answer: &str, meaning: &str) -> Result<f64, VerifyError> {
        let answer = answer.trim();
        let meaning = meaning.trim();
        let similarity = self
            .backend
            .similarity(answer, meaning)
            .await
            .map_err(|e| VerifyError::local(format!("{e:#}")))?;
        if !similarity.is_finite() {
            return Err(VerifyError::local(format!(
                "{} returned non-finite similarity {similarity} for '{meaning}'",
                self.backend.name()
            )));
        }
        let score = (similarity * MAX_SCORE).clamp(0.0, MAX_SCORE);
        debug!(answer, meaning, score, "local score");
        Ok(score)
    }
}

// ---------------------------------------------------------------------------
// Remote scorer
// ---------------------------------------------------------------------------

/// Settings for remote scoring requests.
#[derive(Debug, Clone)]
pub struct RemoteScorerConfig {
    /// Model or deployment name passed to the backend.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
    /// Maximum reply tokens.
    pub max_tokens: u32,
    /// Deadline for one backend call.
    pub timeout: Duration,
}

impl Default for RemoteScorerConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            temperature: 0.7,
            max_tokens: 800,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Scores an answer against the whole canonical meaning with a chat model.
#[derive(Clone)]
pub struct RemoteScorer {
    backend: Arc<dyn ChatBackend>,
    config: RemoteScorerConfig,
}

impl RemoteScorer {
    pub fn new(backend: Arc<dyn ChatBackend>, config: RemoteScorerConfig) -> Self {
        Self { backend, config }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Ask the backend for a 0-100 score. A reply without a number scores 0.
    #[instrument(skip(self), fields(backend = %self.backend.name()))]
    pub async fn score(&self, answer: &str, canonical: &str) -> Result<f64, VerifyError> {
        let request = ChatRequest {
            model: self.config.model.clone(),
            system_prompt: REMOTE_SYSTEM_PROMPT.to_string(),
            prompt: build_remote_prompt(answer, canonical),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = tokio::time::timeout(self.config.timeout, self.backend.chat(&request))
            .await
            .map_err(|_| {
                VerifyError::remote(format!(
                    "request timed out after {}s",
                    self.config.timeout.as_secs_f64()
                ))
            })?
            .map_err(|e| VerifyError::remote(format!("{e:#}")))?;

        match parse_score(&response.content) {
            Ok(score) => {
                debug!(score, latency_ms = response.latency_ms, "remote score");
                Ok(score)
            }
            Err(e) => {
                warn!("{e}; scoring as 0");
                Ok(0.0)
            }
        }
    }
}

/// User message for the remote backend.
pub fn build_remote_prompt(answer: &str, canonical: &str) -> String {
    format!("回答: {}. 答案: {}", answer.trim(), canonical.trim())
}

/// Extract the first numeric token from a free-text reply, clamped to 0-100.
pub fn parse_score(reply: &str) -> Result<f64, VerifyError> {
    SCORE_TOKEN
        .find(reply)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .map(|v| v.clamp(0.0, MAX_SCORE))
        .ok_or_else(|| VerifyError::ScoreParseFailure(reply.to_string()))
}
