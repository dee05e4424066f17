//! Core trait definitions for scoring backends.
//!
//! These async traits are implemented by the `meaningcheck-providers` crate.
//! The verification engine only sees them through `Arc<dyn ...>` handles so a
//! single expensive backend instance is shared by every in-flight request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Remote chat backend
// ---------------------------------------------------------------------------

/// Trait for LLM chat backends used as the remote scorer.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Human-readable backend name (e.g. "azure").
    fn name(&self) -> &str;

    /// Send a system + user prompt pair and return the free-text reply.
    async fn chat(&self, request: &ChatRequest) -> anyhow::Result<ChatResponse>;
}

/// A single-turn chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model or deployment identifier. Backends that bake the model into
    /// their endpoint ignore it.
    pub model: String,
    /// Instruction message.
    pub system_prompt: String,
    /// User message.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f64,
}

/// Reply from a chat backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The raw reply text.
    pub content: String,
    /// Model that actually answered.
    pub model: String,
    /// Latency in milliseconds.
    pub latency_ms: u64,
}

// ---------------------------------------------------------------------------
// Local similarity backend
// ---------------------------------------------------------------------------

/// Trait for backends that compare two strings directly.
#[async_trait]
pub trait SimilarityBackend: Send + Sync {
    fn name(&self) -> &str;

    /// Similarity of the two texts in `[0, 1]`. Deterministic for identical
    /// inputs.
    async fn similarity(&self, text1: &str, text2: &str) -> anyhow::Result<f64>;
}

/// Trait for embedding models.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    /// Embed every text, returning one vector per input in the same order.
    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// A [`SimilarityBackend`] built from any [`Embedder`] using cosine
/// similarity.
pub struct EmbeddingSimilarity<E> {
    embedder: E,
}

impl<E: Embedder> EmbeddingSimilarity<E> {
    pub fn new(embedder: E) -> Self {
        Self { embedder }
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }
}

#[async_trait]
impl<E: Embedder> SimilarityBackend for EmbeddingSimilarity<E> {
    fn name(&self) -> &str {
        self.embedder.name()
    }

    async fn similarity(&self, text1: &str, text2: &str) -> anyhow::Result<f64> {
        let vectors = self
            .embedder
            .embed(&[text1.to_string(), text2.to_string()])
            .await?;
        let [a, b] = vectors.as_slice() else {
            anyhow::bail!(
                "embedder '{}' returned {} vectors for 2 inputs",
                self.embedder.name(),
                vectors.len()
            );
        };
        let cosine = cosine_similarity(a, b).ok_or_else(|| {
            anyhow::anyhow!(
                "embedder '{}' returned unusable vectors ({} vs {} dims)",
                self.embedder.name(),
                a.len(),
                b.len()
            )
        })?;
        Ok(f64::from(cosine).clamp(0.0, 1.0))
    }
}

/// Cosine similarity of two vectors. `None` when the lengths differ, either
/// vector has zero norm, or a component is not finite.
///
/// Accumulates in `f64` so vectors with large components do not overflow.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Option<f32> {
    if a.len() != b.len() || a.is_empty() {
        return None;
    }
    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if !denom.is_finite() || denom <= f64::from(f32::EPSILON) {
        return None;
    }
    let cosine = dot / denom;
    cosine.is_finite().then_some(cosine.clamp(-1.0, 1.0) as f32)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TableEmbedder;

    #[async_trait]
    impl Embedder for TableEmbedder {
        fn name(&self) -> &str {
            "table"
        }

        async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
            Ok(texts
                .iter()
                .map(|t| match t.as_str() {
                    "north" => vec![0.0, 1.0],
                    "up" => vec![0.0, 2.0],
                    "east" => vec![1.0, 0.0],
                    "south" => vec![0.0, -1.0],
                    _ => vec![0.0],
                })
                .collect())
        }
    }

    #[test]
    fn cosine_of_parallel_vectors_is_one() {
        let sim = cosine_similarity(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_rejects_mismatched_or_zero_vectors() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), None);
        assert_eq!(cosine_similarity(&[], &[]), None);
    }

    #[test]
    fn cosine_rejects_non_finite_components() {
        assert_eq!(cosine_similarity(&[f32::INFINITY, 1.0], &[1.0, 1.0]), None);
        assert_eq!(cosine_similarity(&[f32::NAN, 1.0], &[1.0, 1.0]), None);
    }

    #[test]
    fn cosine_of_huge_components_stays_finite() {
        let big = [f32::MAX, f32::MAX];
        let sim = cosine_similarity(&big, &big).unwrap();
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn embedding_similarity_uses_cosine() {
        let backend = EmbeddingSimilarity::new(TableEmbedder);
        let same = backend.similarity("north", "up").await.unwrap();
        assert!((same - 1.0).abs() < 1e-6);
        let orthogonal = backend.similarity("north", "east").await.unwrap();
        assert!(orthogonal.abs() < 1e-6);
    }

    #[tokio::test]
    async fn negative_cosine_clamps_to_zero() {
        let backend = EmbeddingSimilarity::new(TableEmbedder);
        let opposite = backend.similarity("north", "south").await.unwrap();
        assert_eq!(opposite, 0.0);
    }

    #[tokio::test]
    async fn incompatible_vectors_are_an_error() {
        let backend = EmbeddingSimilarity::new(TableEmbedder);
        let err = backend.similarity("north", "unknown").await.unwrap_err();
        assert!(err.to_string().contains("unusable vectors"));
    }
}
