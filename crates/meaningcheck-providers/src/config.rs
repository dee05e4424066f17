//! Backend configuration and factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use meaningcheck_core::fanout::DEFAULT_MAX_WORKERS;
use meaningcheck_core::scorer::RemoteScorerConfig;
use meaningcheck_core::traits::{ChatBackend, EmbeddingSimilarity, SimilarityBackend};
use meaningcheck_core::verifier::DEFAULT_PASS_THRESHOLD;

use crate::azure::AzureOpenAiChat;
use crate::ollama::{OllamaChat, OllamaEmbedder, DEFAULT_BASE_URL as OLLAMA_URL};
use crate::openai::{OpenAiChat, OpenAiEmbedder};

/// Remote chat backend used for whole-meaning scoring.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatConfig {
    OpenAI {
        api_key: String,
        #[serde(default = "default_openai_chat_model")]
        model: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Azure {
        api_key: String,
        endpoint: String,
        deployment: String,
        #[serde(default)]
        api_version: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_chat_model")]
        model: String,
    },
}

/// Local embedding backend used for per-sense scoring.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmbeddingConfig {
    OpenAI {
        api_key: String,
        #[serde(default = "default_openai_embedding_model")]
        model: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        #[serde(default = "default_ollama_embedding_model")]
        model: String,
    },
}

impl std::fmt::Debug for ChatConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatConfig::OpenAI {
                api_key: _,
                model,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ChatConfig::Azure {
                api_key: _,
                endpoint,
                deployment,
                api_version,
            } => f
                .debug_struct("Azure")
                .field("api_key", &"***")
                .field("endpoint", endpoint)
                .field("deployment", deployment)
                .field("api_version", api_version)
                .finish(),
            ChatConfig::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

impl std::fmt::Debug for EmbeddingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingConfig::OpenAI {
                api_key: _,
                model,
                base_url,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("model", model)
                .field("base_url", base_url)
                .finish(),
            EmbeddingConfig::Ollama { base_url, model } => f
                .debug_struct("Ollama")
                .field("base_url", base_url)
                .field("model", model)
                .finish(),
        }
    }
}

fn default_ollama_url() -> String {
    OLLAMA_URL.to_string()
}
fn default_openai_chat_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_ollama_chat_model() -> String {
    "qwen2.5:7b".to_string()
}
fn default_openai_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_ollama_embedding_model() -> String {
    "bge-m3".to_string()
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_chat_model(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        EmbeddingConfig::Ollama {
            base_url: default_ollama_url(),
            model: default_ollama_embedding_model(),
        }
    }
}

/// Top-level meaningcheck configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeaningcheckConfig {
    /// Remote chat backend.
    #[serde(default)]
    pub chat: ChatConfig,
    /// Local embedding backend.
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    /// Score (0-100) at or above which an answer passes.
    #[serde(default = "default_pass_threshold")]
    pub pass_threshold: f64,
    /// Max concurrent local scoring calls per verification.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Deadline for one remote scoring call, in seconds.
    #[serde(default = "default_remote_timeout")]
    pub remote_timeout_secs: u64,
    /// Remote sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    /// Remote reply token limit.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Durable result cache.
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

fn default_pass_threshold() -> f64 {
    DEFAULT_PASS_THRESHOLD
}
fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}
fn default_remote_timeout() -> u64 {
    30
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    800
}
fn default_cache_path() -> PathBuf {
    PathBuf::from("./meaningcheck-cache.json")
}

impl Default for MeaningcheckConfig {
    fn default() -> Self {
        Self {
            chat: ChatConfig::default(),
            embedding: EmbeddingConfig::default(),
            pass_threshold: default_pass_threshold(),
            max_workers: default_max_workers(),
            remote_timeout_secs: default_remote_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            cache_path: default_cache_path(),
        }
    }
}

impl MeaningcheckConfig {
    /// Remote scorer settings derived from this config.
    pub fn remote_scorer_config(&self) -> RemoteScorerConfig {
        let model = match &self.chat {
            ChatConfig::OpenAI { model, .. } | ChatConfig::Ollama { model, .. } => model.clone(),
            ChatConfig::Azure { deployment, .. } => deployment.clone(),
        };
        RemoteScorerConfig {
            model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: Duration::from_secs(self.remote_timeout_secs),
        }
    }

    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            (0.0..=100.0).contains(&self.pass_threshold),
            "pass_threshold must be between 0 and 100, got {}",
            self.pass_threshold
        );
        anyhow::ensure!(self.max_workers >= 1, "max_workers must be at least 1");
        anyhow::ensure!(
            self.remote_timeout_secs >= 1,
            "remote_timeout_secs must be at least 1"
        );
        Ok(())
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
///
/// Substituted values are not scanned again, so a value containing `${...}`
/// is kept literally.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    let mut from = 0;
    while let Some(offset) = result[from..].find("${") {
        let start = from + offset;
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!(
            "{}{}{}",
            &result[..start],
            value,
            &result[start + end + 1..]
        );
        from = start + value.len();
    }
    result
}

fn resolve_chat_config(config: &ChatConfig) -> ChatConfig {
    match config {
        ChatConfig::OpenAI {
            api_key,
            model,
            base_url,
            org_id,
        } => ChatConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            model: resolve_env_vars(model),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
            org_id: org_id.as_ref().map(|o| resolve_env_vars(o)),
        },
        ChatConfig::Azure {
            api_key,
            endpoint,
            deployment,
            api_version,
        } => ChatConfig::Azure {
            api_key: resolve_env_vars(api_key),
            endpoint: resolve_env_vars(endpoint),
            deployment: resolve_env_vars(deployment),
            api_version: api_version.as_ref().map(|v| resolve_env_vars(v)),
        },
        ChatConfig::Ollama { base_url, model } => ChatConfig::Ollama {
            base_url: resolve_env_vars(base_url),
            model: resolve_env_vars(model),
        },
    }
}

fn resolve_embedding_config(config: &EmbeddingConfig) -> EmbeddingConfig {
    match config {
        EmbeddingConfig::OpenAI {
            api_key,
            model,
            base_url,
        } => EmbeddingConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            model: resolve_env_vars(model),
            base_url: base_url.as_ref().map(|u| resolve_env_vars(u)),
        },
        EmbeddingConfig::Ollama { base_url, model } => EmbeddingConfig::Ollama {
            base_url: resolve_env_vars(base_url),
            model: resolve_env_vars(model),
        },
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `meaningcheck.toml` in the current directory
/// 2. `~/.config/meaningcheck/config.toml`
///
/// Environment variable overrides: `MEANINGCHECK_OPENAI_KEY`,
/// `MEANINGCHECK_AZURE_KEY` (applied to the matching chat backend).
pub fn load_config() -> Result<MeaningcheckConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<MeaningcheckConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("meaningcheck.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => MeaningcheckConfig::default(),
    };

    // Apply env var overrides
    match &mut config.chat {
        ChatConfig::OpenAI { api_key, .. } => {
            if let Ok(key) = std::env::var("MEANINGCHECK_OPENAI_KEY") {
                *api_key = key;
            }
        }
        ChatConfig::Azure { api_key, .. } => {
            if let Ok(key) = std::env::var("MEANINGCHECK_AZURE_KEY") {
                *api_key = key;
            }
        }
        ChatConfig::Ollama { .. } => {}
    }
    if let EmbeddingConfig::OpenAI { api_key, .. } = &mut config.embedding {
        if let Ok(key) = std::env::var("MEANINGCHECK_OPENAI_KEY") {
            *api_key = key;
        }
    }

    config.chat = resolve_chat_config(&config.chat);
    config.embedding = resolve_embedding_config(&config.embedding);
    config.validate()?;

    Ok(config)
}

/// Parse a config document without touching the environment.
pub fn parse_config(content: &str) -> Result<MeaningcheckConfig> {
    Ok(toml::from_str::<MeaningcheckConfig>(content)?)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("meaningcheck"))
}

/// Create the remote chat backend from its configuration.
pub fn create_chat_backend(config: &ChatConfig) -> Result<Arc<dyn ChatBackend>> {
    match config {
        ChatConfig::OpenAI {
            api_key,
            model,
            base_url,
            org_id,
        } => Ok(Arc::new(OpenAiChat::new(
            api_key,
            model,
            base_url.clone(),
            org_id.clone(),
        )?)),
        ChatConfig::Azure {
            api_key,
            endpoint,
            deployment,
            api_version,
        } => Ok(Arc::new(AzureOpenAiChat::new(
            api_key,
            endpoint,
            deployment,
            api_version.as_deref(),
        )?)),
        ChatConfig::Ollama { base_url, model } => Ok(Arc::new(OllamaChat::new(base_url, model)?)),
    }
}

/// Create the shared local similarity backend from its configuration.
pub fn create_similarity_backend(config: &EmbeddingConfig) -> Result<Arc<dyn SimilarityBackend>> {
    match config {
        EmbeddingConfig::OpenAI {
            api_key,
            model,
            base_url,
        } => Ok(Arc::new(EmbeddingSimilarity::new(OpenAiEmbedder::new(
            api_key,
            model,
            base_url.clone(),
        )?))),
        EmbeddingConfig::Ollama { base_url, model } => Ok(Arc::new(EmbeddingSimilarity::new(
            OllamaEmbedder::new(base_url, model)?,
        ))),
    }
}
