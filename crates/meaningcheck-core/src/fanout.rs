//! Bounded-concurrency fan-out.
//!
//! [`fan_out`] is the generic primitive: run one future per item with at most
//! `limit` in flight, then reduce to successes and failures. [`FanOutScorer`]
//! uses it to score an answer against every sense of a canonical meaning.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::error::VerifyError;
use crate::meaning::split_meanings;
use crate::scorer::LocalScorer;

/// Default cap on concurrent local scoring calls per verification.
pub const DEFAULT_MAX_WORKERS: usize = 5;

/// Result of a fan-out: every success plus the rendered failures.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchOutcome<T> {
    pub successes: Vec<T>,
    pub failures: Vec<String>,
}

impl<T> BatchOutcome<T> {
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}

/// Run `f` over every item with at most `limit` calls in flight.
///
/// Completion order is unspecified. A failed item is logged and recorded in
/// [`BatchOutcome::failures`]; it never aborts the others.
pub async fn fan_out<I, T, E, F, Fut>(items: I, limit: usize, f: F) -> BatchOutcome<T>
where
    I: IntoIterator,
    I::Item: Display,
    F: Fn(I::Item) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut futures = FuturesUnordered::new();

    for item in items {
        let semaphore = Arc::clone(&semaphore);
        let label = item.to_string();
        let fut = f(item);
        futures.push(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => fut.await.map_err(|e| e.to_string()),
                Err(_) => Err("semaphore closed".to_string()),
            };
            (label, result)
        });
    }

    let mut outcome = BatchOutcome {
        successes: Vec::new(),
        failures: Vec::new(),
    };

    while let Some((label, result)) = futures.next().await {
        match result {
            Ok(value) => outcome.successes.push(value),
            Err(e) => {
                warn!("fan-out item '{label}' failed: {e}");
                outcome.failures.push(format!("{label}: {e}"));
            }
        }
    }

    outcome
}

/// Scores an answer against every sense and keeps the best.
#[derive(Clone)]
pub struct FanOutScorer {
    scorer: LocalScorer,
    max_workers: usize,
}

impl FanOutScorer {
    pub fn new(scorer: LocalScorer) -> Self {
        Self {
            scorer,
            max_workers: DEFAULT_MAX_WORKERS,
        }
    }

    /// Override the per-call worker cap (minimum 1).
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn backend_name(&self) -> &str {
        self.scorer.backend_name()
    }

    /// Best local score across all senses of `canonical`.
    ///
    /// Fails with [`VerifyError::NoMatchableMeaning`] when there is nothing to
    /// compare against, and with a local [`VerifyError::BackendFailure`] when
    /// every per-sense call failed.
    pub async fn score_against_all(
        &self,
        answer: &str,
        canonical: &str,
    ) -> Result<f64, VerifyError> {
        let meanings = split_meanings(canonical);
        if meanings.is_empty() {
            return Err(VerifyError::NoMatchableMeaning);
        }

        let limit = meanings.len().min(self.max_workers);
        debug!(senses = meanings.len(), limit, "local fan-out");

        let outcome = fan_out(meanings, limit, |meaning| {
            let scorer = self.scorer.clone();
            async move { scorer.score(answer, &meaning).await }
        })
        .await;

        best_score(&outcome).ok_or_else(|| {
            VerifyError::local(format!(
                "all {} meaning scorings failed: {}",
                outcome.failure_count(),
                outcome.failures.join("; ")
            ))
        })
    }
}

fn best_score(outcome: &BatchOutcome<f64>) -> Option<f64> {
    outcome.successes.iter().copied().reduce(f64::max)
}
