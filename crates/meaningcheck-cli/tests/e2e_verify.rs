//! End-to-end verification over mock backends and a real cache file.

use std::collections::HashMap;
use std::sync::Arc;

use meaningcheck_core::{
    FanOutScorer, LocalScorer, RemoteScorer, RemoteScorerConfig, ResultCache, Verifier,
    VerifyError,
};
use meaningcheck_providers::mock::{MockChat, MockSimilarity};
use tempfile::TempDir;

const CANONICAL: &str = "反常的，异常的；变态的";

fn similarity() -> Arc<MockSimilarity> {
    let mut scores = HashMap::new();
    scores.insert("反常的".to_string(), 0.92);
    scores.insert("异常的".to_string(), 0.88);
    scores.insert("变态的".to_string(), 0.40);
    Arc::new(MockSimilarity::new(scores))
}

async fn verifier(
    dir: &TempDir,
    local: Arc<MockSimilarity>,
    remote: Arc<MockChat>,
) -> Verifier {
    let cache = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
    Verifier::new(
        FanOutScorer::new(LocalScorer::new(local)),
        RemoteScorer::new(remote, RemoteScorerConfig::default()),
        Arc::new(cache),
    )
}

#[tokio::test]
async fn worked_example_then_cache_hit() {
    let dir = TempDir::new().unwrap();
    let local = similarity();
    let remote = Arc::new(MockChat::with_reply("95"));
    let v = verifier(&dir, local.clone(), remote.clone()).await;

    let score = v.verify("不正常", CANONICAL).await.unwrap();
    assert!((score - 92.0).abs() < 1e-9);
    assert_eq!(local.call_count(), 3);
    assert_eq!(remote.call_count(), 1);
    assert_eq!(
        remote.last_request().unwrap().prompt,
        format!("回答: 不正常. 答案: {CANONICAL}")
    );

    let again = v.verify("不正常", CANONICAL).await.unwrap();
    assert_eq!(again, score);
    assert_eq!(local.call_count(), 3);
    assert_eq!(remote.call_count(), 1);
}

#[tokio::test]
async fn cached_score_survives_restart() {
    let dir = TempDir::new().unwrap();
    {
        let v = verifier(&dir, similarity(), Arc::new(MockChat::with_reply("60分"))).await;
        let score = v.verify("不正常", CANONICAL).await.unwrap();
        assert!((score - 60.0).abs() < 1e-9);
    }

    let local = similarity();
    let remote = Arc::new(MockChat::failing());
    let v = verifier(&dir, local.clone(), remote.clone()).await;
    let verdict = v.check("不正常", CANONICAL, 50.0).await;
    assert_eq!(verdict.similarity, Some(60.0));
    assert!(verdict.passed);
    assert_eq!(local.call_count(), 0);
    assert_eq!(remote.call_count(), 0);
}

#[tokio::test]
async fn remote_failure_is_not_cached() {
    let dir = TempDir::new().unwrap();
    let v = verifier(&dir, similarity(), Arc::new(MockChat::failing())).await;

    let err = v.verify("不正常", CANONICAL).await.unwrap_err();
    assert!(matches!(err, VerifyError::BackendFailure { .. }));
    assert!(v.cache().is_empty().await);
    assert!(!dir.path().join("cache.json").exists());
}

#[tokio::test]
async fn partial_local_failure_still_scores() {
    let dir = TempDir::new().unwrap();
    let local = Arc::new(
        MockSimilarity::new(HashMap::from([("异常的".to_string(), 0.85)])).failing_on("反常的"),
    );
    let v = verifier(&dir, local, Arc::new(MockChat::with_reply("90"))).await;

    let score = v.verify("不正常", CANONICAL).await.unwrap();
    assert!((score - 85.0).abs() < 1e-9);
}

#[tokio::test]
async fn concurrent_verifications_share_one_cache_file() {
    let dir = TempDir::new().unwrap();
    let v = verifier(
        &dir,
        Arc::new(MockSimilarity::with_fixed_score(0.5)),
        Arc::new(MockChat::with_reply("80")),
    )
    .await;

    let mut handles = Vec::new();
    for i in 0..10 {
        let v = v.clone();
        handles.push(tokio::spawn(async move {
            v.verify(&format!("answer-{i}"), "含义").await
        }));
    }
    for handle in handles {
        let score = handle.await.unwrap().unwrap();
        assert!((score - 50.0).abs() < 1e-9);
    }

    let reopened = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
    assert_eq!(reopened.len().await, 10);
}
