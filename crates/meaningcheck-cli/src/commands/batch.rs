//! The `meaningcheck batch` command.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};

use meaningcheck_core::Verdict;

use super::{build_verifier, VerifyOptions};

/// One quiz item: a learner answer and the reference meaning.
#[derive(Debug, Clone, Deserialize)]
struct BatchItem {
    /// Headword, shown in the summary when present.
    #[serde(default)]
    word: Option<String>,
    answer: String,
    #[serde(alias = "chinese_meaning")]
    meaning: String,
}

#[derive(Debug, Serialize)]
struct BatchResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    word: Option<String>,
    answer: String,
    meaning: String,
    #[serde(flatten)]
    verdict: Verdict,
}

pub async fn execute(
    input: PathBuf,
    parallelism: usize,
    output: Option<PathBuf>,
    threshold: Option<f64>,
    cache: Option<PathBuf>,
    config: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(parallelism >= 1, "parallelism must be at least 1");

    let content = std::fs::read_to_string(&input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let items: Vec<BatchItem> = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse {}", input.display()))?;

    let (verifier, config) = build_verifier(VerifyOptions {
        threshold,
        cache,
        config,
    })
    .await?;

    eprintln!(
        "meaningcheck v{}: verifying {} answers (parallelism {})",
        env!("CARGO_PKG_VERSION"),
        items.len(),
        parallelism
    );

    let start = Instant::now();
    let threshold = config.pass_threshold;
    let results: Vec<BatchResult> = stream::iter(items)
        .map(|item| {
            let verifier = verifier.clone();
            async move {
                let verdict = verifier.check(&item.answer, &item.meaning, threshold).await;
                BatchResult {
                    word: item.word,
                    answer: item.answer,
                    meaning: item.meaning,
                    verdict,
                }
            }
        })
        .buffered(parallelism)
        .collect()
        .await;

    print_summary(&results, threshold);
    eprintln!("Completed in {:.1}s", start.elapsed().as_secs_f64());

    if let Some(path) = output {
        let json = serde_json::to_string_pretty(&results)?;
        std::fs::write(&path, json)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Results saved to: {}", path.display());
    }

    Ok(())
}

fn print_summary(results: &[BatchResult], threshold: f64) {
    use comfy_table::{Cell, Table};

    let mut table = Table::new();
    table.set_header(vec!["Word", "Answer", "Meaning", "Similarity", "Passed"]);

    for r in results {
        let similarity = match (&r.verdict.similarity, &r.verdict.reason) {
            (Some(score), _) => format!("{score:.1}"),
            (None, Some(reason)) => format!("- ({reason})"),
            (None, None) => "-".to_string(),
        };
        table.add_row(vec![
            Cell::new(r.word.as_deref().unwrap_or("")),
            Cell::new(&r.answer),
            Cell::new(&r.meaning),
            Cell::new(similarity),
            Cell::new(if r.verdict.passed { "yes" } else { "no" }),
        ]);
    }

    let passed = results.iter().filter(|r| r.verdict.passed).count();
    println!("{table}");
    println!(
        "Passed: {passed}/{} (threshold {threshold:.1})",
        results.len()
    );
}
