//! Durable memo of combined verification scores.
//!
//! Keys are the literal `(answer, canonical)` pair with no normalization.
//! Entries never expire. The whole map is loaded on [`ResultCache::open`] and
//! the whole file is rewritten on every [`ResultCache::put`].
//!
//! On disk the cache is a nested JSON object so neither string needs escaping:
//!
//! ```json
//! { "不正常": { "反常的，异常的；变态的": 92.0 } }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::CacheError;

type Entries = HashMap<String, HashMap<String, f64>>;

/// A cached score with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub answer: String,
    pub canonical: String,
    pub score: f64,
}

/// Process-wide answer/score cache backed by a JSON file.
#[derive(Debug)]
pub struct ResultCache {
    path: PathBuf,
    entries: RwLock<Entries>,
}

impl ResultCache {
    /// Load the cache from `path`. A missing file yields an empty cache.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let path = path.into();
        let entries = match tokio::fs::read_to_string(&path).await {
            Ok(content) if content.trim().is_empty() => Entries::new(),
            Ok(content) => {
                serde_json::from_str::<Entries>(&content).map_err(|source| {
                    CacheError::Malformed {
                        path: path.display().to_string(),
                        source,
                    }
                })?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Entries::new(),
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        debug!(
            path = %path.display(),
            entries = count(&entries),
            "opened result cache"
        );

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Cached score for the exact pair, if any.
    pub async fn get(&self, answer: &str, canonical: &str) -> Option<f64> {
        let entries = self.entries.read().await;
        entries
            .get(answer)
            .and_then(|by_canonical| by_canonical.get(canonical))
            .copied()
    }

    /// Record a score and rewrite the backing file. Last writer wins.
    ///
    /// The in-memory entry is kept even if persisting fails.
    pub async fn put(&self, answer: &str, canonical: &str, score: f64) -> Result<(), CacheError> {
        let mut entries = self.entries.write().await;
        entries
            .entry(answer.to_string())
            .or_default()
            .insert(canonical.to_string(), score);
        persist(&self.path, &entries).await
    }

    pub async fn len(&self) -> usize {
        count(&*self.entries.read().await)
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of every entry, sorted by answer then canonical meaning.
    pub async fn entries(&self) -> Vec<CacheEntry> {
        let entries = self.entries.read().await;
        let mut out: Vec<CacheEntry> = entries
            .iter()
            .flat_map(|(answer, by_canonical)| {
                by_canonical.iter().map(move |(canonical, score)| CacheEntry {
                    answer: answer.clone(),
                    canonical: canonical.clone(),
                    score: *score,
                })
            })
            .collect();
        out.sort_by(|a, b| {
            a.answer
                .cmp(&b.answer)
                .then_with(|| a.canonical.cmp(&b.canonical))
        });
        out
    }

    /// Flush the current contents and release the cache.
    pub async fn close(self) -> Result<(), CacheError> {
        let entries = self.entries.into_inner();
        if count(&entries) > 0 {
            persist(&self.path, &entries).await?;
        }
        Ok(())
    }
}

fn count(entries: &Entries) -> usize {
    entries.values().map(HashMap::len).sum()
}

/// Write the full map to `<path>.tmp` and rename it over `path`.
async fn persist(path: &Path, entries: &Entries) -> Result<(), CacheError> {
    let io_err = |source| CacheError::Io {
        path: path.display().to_string(),
        source,
    };

    // Sorted output keeps the file diffable.
    let sorted: BTreeMap<&String, BTreeMap<&String, &f64>> = entries
        .iter()
        .map(|(answer, by_canonical)| (answer, by_canonical.iter().collect()))
        .collect();
    let json = serde_json::to_string_pretty(&sorted).map_err(|source| CacheError::Malformed {
        path: path.display().to_string(),
        source,
    })?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, json).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn missing_file_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
        assert!(cache.is_empty().await);
        assert_eq!(cache.get("a", "b").await, None);
    }

    #[tokio::test]
    async fn put_then_get_returns_score() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
        cache.put("不正常", "反常的，异常的；变态的", 92.0).await.unwrap();
        assert_eq!(cache.get("不正常", "反常的，异常的；变态的").await, Some(92.0));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn key_is_the_literal_pair() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
        cache.put("a", "x;y", 50.0).await.unwrap();
        assert_eq!(cache.get("a ", "x;y").await, None);
        assert_eq!(cache.get("a", "x; y").await, None);
        assert_eq!(cache.get("a", "x;y").await, Some(50.0));
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("cache.json");
        {
            let cache = ResultCache::open(&path).await.unwrap();
            cache.put("a", "b", 10.0).await.unwrap();
            cache.put("a", "c", 20.0).await.unwrap();
            cache.put("d", "b", 30.0).await.unwrap();
            cache.close().await.unwrap();
        }
        let reopened = ResultCache::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 3);
        assert_eq!(reopened.get("a", "c").await, Some(20.0));
        assert_eq!(reopened.get("d", "b").await, Some(30.0));
    }

    #[tokio::test]
    async fn on_disk_format_is_nested_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = ResultCache::open(&path).await.unwrap();
        cache.put("不正常", "反常的", 92.0).await.unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["不正常"]["反常的"], serde_json::json!(92.0));
        assert!(!dir.path().join("cache.json.tmp").exists());
    }

    #[tokio::test]
    async fn last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
        cache.put("a", "b", 10.0).await.unwrap();
        cache.put("a", "b", 15.0).await.unwrap();
        assert_eq!(cache.get("a", "b").await, Some(15.0));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        std::fs::write(&path, "[1, 2").unwrap();
        let err = ResultCache::open(&path).await.unwrap_err();
        assert!(matches!(err, CacheError::Malformed { .. }));
    }

    #[tokio::test]
    async fn concurrent_puts_are_all_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.json");
        let cache = Arc::new(ResultCache::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..20 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache.put(&format!("answer-{i}"), "meaning", i as f64).await.unwrap();
                cache.get(&format!("answer-{i}"), "meaning").await
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), Some(i as f64));
        }

        let reopened = ResultCache::open(&path).await.unwrap();
        assert_eq!(reopened.len().await, 20);
    }

    #[tokio::test]
    async fn entries_are_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = ResultCache::open(dir.path().join("cache.json")).await.unwrap();
        cache.put("b", "y", 1.0).await.unwrap();
        cache.put("a", "z", 2.0).await.unwrap();
        cache.put("a", "x", 3.0).await.unwrap();
        let keys: Vec<(String, String)> = cache
            .entries()
            .await
            .into_iter()
            .map(|e| (e.answer, e.canonical))
            .collect();
        assert_eq!(
            keys,
            vec![
                ("a".to_string(), "x".to_string()),
                ("a".to_string(), "z".to_string()),
                ("b".to_string(), "y".to_string()),
            ]
        );
    }
}
