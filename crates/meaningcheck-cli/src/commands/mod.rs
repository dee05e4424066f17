pub mod batch;
pub mod cache;
pub mod check;
pub mod init;
pub mod split;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};

use meaningcheck_core::{FanOutScorer, LocalScorer, RemoteScorer, ResultCache, Verifier};
use meaningcheck_providers::config::load_config_from;
use meaningcheck_providers::{create_chat_backend, create_similarity_backend, MeaningcheckConfig};

/// Settings shared by every command that verifies answers.
pub struct VerifyOptions {
    pub threshold: Option<f64>,
    pub cache: Option<PathBuf>,
    pub config: Option<PathBuf>,
}

/// Load config, apply CLI overrides, and wire up a verifier.
pub async fn build_verifier(options: VerifyOptions) -> Result<(Verifier, MeaningcheckConfig)> {
    let mut config = load_config_from(options.config.as_deref())?;
    if let Some(threshold) = options.threshold {
        anyhow::ensure!(
            (0.0..=100.0).contains(&threshold),
            "threshold must be between 0 and 100"
        );
        config.pass_threshold = threshold;
    }
    if let Some(cache) = options.cache {
        config.cache_path = cache;
    }

    let similarity = create_similarity_backend(&config.embedding)?;
    let chat = create_chat_backend(&config.chat)?;
    let cache = ResultCache::open(&config.cache_path)
        .await
        .with_context(|| format!("failed to open cache {}", config.cache_path.display()))?;

    tracing::debug!(chat = ?config.chat, embedding = ?config.embedding, "backends configured");

    let verifier = Verifier::new(
        FanOutScorer::new(LocalScorer::new(similarity)).with_max_workers(config.max_workers),
        RemoteScorer::new(chat, config.remote_scorer_config()),
        Arc::new(cache),
    );
    Ok((verifier, config))
}
