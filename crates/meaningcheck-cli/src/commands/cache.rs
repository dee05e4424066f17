//! The `meaningcheck cache` command.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Subcommand;

use meaningcheck_core::ResultCache;
use meaningcheck_providers::config::load_config_from;

#[derive(Subcommand)]
pub enum CacheAction {
    /// List every cached score
    List {
        /// Cache file (overrides config)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Show entry count and location
    Stats {
        /// Cache file (overrides config)
        #[arg(long)]
        cache: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

pub async fn execute(action: CacheAction) -> Result<()> {
    match action {
        CacheAction::List { cache, config } => {
            let cache = open(cache, config).await?;
            let entries = cache.entries().await;
            if entries.is_empty() {
                println!("Cache is empty.");
                return Ok(());
            }

            let mut table = comfy_table::Table::new();
            table.set_header(vec!["Answer", "Meaning", "Score"]);
            for entry in &entries {
                table.add_row(vec![
                    entry.answer.clone(),
                    entry.canonical.clone(),
                    format!("{:.1}", entry.score),
                ]);
            }
            println!("{table}");
        }
        CacheAction::Stats { cache, config } => {
            let cache = open(cache, config).await?;
            println!("Cache: {}", cache.path().display());
            println!("Entries: {}", cache.len().await);
        }
    }
    Ok(())
}

async fn open(cache: Option<PathBuf>, config: Option<PathBuf>) -> Result<ResultCache> {
    let path = match cache {
        Some(path) => path,
        None => load_config_from(config.as_deref())?.cache_path,
    };
    ResultCache::open(&path)
        .await
        .with_context(|| format!("failed to open cache {}", path.display()))
}
