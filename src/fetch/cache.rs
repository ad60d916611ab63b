// src/fetch/cache.rs

use std::{future::Future, sync::Arc};
use tokio::sync::OnceCell;
use tracing::info;

use crate::error::Result;
use crate::model::RawRecord;

/// Load-once memo of the raw rows for one source URL.
///
/// The first successful load is kept for the lifetime of the cache; there is
/// no invalidation. A failed load leaves the cache empty so the next caller
/// tries again. Concurrent callers share a single in-flight load.
pub struct DatasetCache {
    url: String,
    rows: OnceCell<Arc<Vec<RawRecord>>>,
}

impl DatasetCache {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            rows: OnceCell::new(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Rows from an earlier successful load, if any.
    pub fn get(&self) -> Option<Arc<Vec<RawRecord>>> {
        self.rows.get().cloned()
    }

    /// Return the cached rows, running `load` with the cache's URL on first use.
    pub async fn get_or_load<F, Fut>(&self, load: F) -> Result<Arc<Vec<RawRecord>>>
    where
        F: FnOnce(String) -> Fut,
        Fut: Future<Output = Result<Vec<RawRecord>>>,
    {
        let rows = self
            .rows
            .get_or_try_init(|| async {
                info!(url = %self.url, "loading dataset");
                load(self.url.clone()).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DashboardError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn one_row() -> Vec<RawRecord> {
        vec![RawRecord::from_fields("1", "30", "A", "11", "1", "2", "3,0")]
    }

    #[tokio::test]
    async fn test_loads_once() {
        let cache = DatasetCache::new("https://example.test/medic.csv");
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let rows = cache
                .get_or_load(|url| {
                    calls.fetch_add(1, Ordering::SeqCst);
                    assert_eq!(url, "https://example.test/medic.csv");
                    async { Ok(one_row()) }
                })
                .await
                .unwrap();
            assert_eq!(rows.len(), 1);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(cache.get().is_some());
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let cache = DatasetCache::new("https://example.test/medic.csv");

        let err = cache
            .get_or_load(|url| async move {
                Err(DashboardError::SourceUnavailable {
                    url,
                    reason: "offline".into(),
                })
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::SourceUnavailable { .. }));
        assert!(cache.get().is_none());

        let rows = cache.get_or_load(|_| async { Ok(one_row()) }).await.unwrap();
        assert_eq!(rows.len(), 1);
    }
}
