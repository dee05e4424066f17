//! Mock backends for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use meaningcheck_core::traits::{ChatBackend, ChatRequest, ChatResponse, SimilarityBackend};

/// A mock chat backend returning a fixed reply, or failing every call.
pub struct MockChat {
    reply: Option<String>,
    call_count: AtomicU32,
    last_request: Mutex<Option<ChatRequest>>,
}

impl MockChat {
    /// Create a mock that always replies with `reply`.
    pub fn with_reply(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Create a mock whose every call fails.
    pub fn failing() -> Self {
        Self {
            reply: None,
            call_count: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Get the number of calls made to this backend.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }

    /// Get the last request made to this backend.
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatBackend for MockChat {
    fn name(&self) -> &str {
        "mock"
    }

    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        *self
            .last_request
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(request.clone());

        match &self.reply {
            Some(content) => Ok(ChatResponse {
                content: content.clone(),
                model: "mock-model".to_string(),
                latency_ms: 1,
            }),
            None => anyhow::bail!("mock chat backend unavailable"),
        }
    }
}

/// A mock similarity backend with per-meaning scores.
///
/// Meanings listed as failing return an error; unlisted meanings get the
/// default score.
pub struct MockSimilarity {
    scores: HashMap<String, f64>,
    failing: HashSet<String>,
    default_score: f64,
    call_count: AtomicU32,
}

impl MockSimilarity {
    /// Create a mock from `meaning -> similarity` pairs (similarity in 0-1).
    pub fn new(scores: HashMap<String, f64>) -> Self {
        Self {
            scores,
            failing: HashSet::new(),
            default_score: 0.0,
            call_count: AtomicU32::new(0),
        }
    }

    /// Create a mock that scores every pair the same.
    pub fn with_fixed_score(score: f64) -> Self {
        Self {
            default_score: score,
            ..Self::new(HashMap::new())
        }
    }

    /// Make scoring against `meaning` fail.
    pub fn failing_on(mut self, meaning: &str) -> Self {
        self.failing.insert(meaning.to_string());
        self
    }

    /// Get the number of calls made to this backend.
    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SimilarityBackend for MockSimilarity {
    fn name(&self) -> &str {
        "mock"
    }

    async fn similarity(&self, _text1: &str, text2: &str) -> anyhow::Result<f64> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(text2) {
            anyhow::bail!("mock similarity failure for '{text2}'");
        }
        Ok(self.scores.get(text2).copied().unwrap_or(self.default_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ChatRequest {
        ChatRequest {
            model: "mock".into(),
            system_prompt: "system".into(),
            prompt: "回答: a. 答案: b".into(),
            max_tokens: 100,
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn fixed_reply() {
        let chat = MockChat::with_reply("95分");
        let response = chat.chat(&request()).await.unwrap();
        assert_eq!(response.content, "95分");
        assert_eq!(chat.call_count(), 1);
        assert_eq!(chat.last_request().unwrap().prompt, "回答: a. 答案: b");
    }

    #[tokio::test]
    async fn failing_chat() {
        let chat = MockChat::failing();
        assert!(chat.chat(&request()).await.is_err());
        assert_eq!(chat.call_count(), 1);
    }

    #[tokio::test]
    async fn similarity_table_and_failures() {
        let mut scores = HashMap::new();
        scores.insert("反常的".to_string(), 0.92);
        let sim = MockSimilarity::new(scores).failing_on("变态的");

        assert_eq!(sim.similarity("不正常", "反常的").await.unwrap(), 0.92);
        assert_eq!(sim.similarity("不正常", "异常的").await.unwrap(), 0.0);
        assert!(sim.similarity("不正常", "变态的").await.is_err());
        assert_eq!(sim.call_count(), 3);
    }
}
