//! The `meaningcheck check` command.

use std::path::PathBuf;

use anyhow::Result;

use super::{build_verifier, VerifyOptions};

pub async fn execute(
    answer: String,
    meaning: String,
    threshold: Option<f64>,
    cache: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    let (verifier, config) = build_verifier(VerifyOptions {
        threshold,
        cache,
        config,
    })
    .await?;

    let verdict = verifier
        .check(&answer, &meaning, config.pass_threshold)
        .await;
    println!("{}", serde_json::to_string(&verdict)?);
    Ok(())
}
