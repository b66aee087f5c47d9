//! Cache writes that outlive the response they were made for.

use swcache_core::{CacheStore, CachedResponse};
use tokio::sync::Mutex;
use tokio::task::JoinSet;

/// Tracks detached cache writes so the host can wait for them.
///
/// A write is spawned as soon as a response is chosen and keeps running even
/// if the caller drops the response. Finished writes are reaped on every new
/// write, so the set only holds what is still running. Dropping the tracker
/// aborts writes that were never settled.
#[derive(Debug, Default)]
pub(crate) struct BackgroundWrites {
    pending: Mutex<Pending>,
}

#[derive(Debug, Default)]
struct Pending {
    tasks: JoinSet<()>,
    /// Writes reaped since the last settle.
    finished: usize,
}

impl Pending {
    fn reap_finished(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join_error(result);
            self.finished += 1;
        }
    }
}

fn log_join_error(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "cache write task panicked or was cancelled");
    }
}

impl BackgroundWrites {
    /// Spawn a write of `entry` into `store`.
    pub(crate) async fn put(&self, store: CacheStore, entry: CachedResponse) {
        let mut pending = self.pending.lock().await;
        pending.reap_finished();
        pending.tasks.spawn(async move {
            match store.put(&entry).await {
                Ok(()) => tracing::debug!(store = store.name(), url = %entry.url, "cached response"),
                Err(e) => tracing::warn!(store = store.name(), url = %entry.url, error = %e, "cache write failed"),
            }
        });
    }

    /// Wait for every write spawned so far. Returns how many completed since
    /// the last settle.
    pub(crate) async fn settle(&self) -> usize {
        let Pending { mut tasks, finished } = std::mem::take(&mut *self.pending.lock().await);
        let mut settled = finished;
        while let Some(result) = tasks.join_next().await {
            log_join_error(result);
            settled += 1;
        }
        settled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use swcache_core::CacheStorage;

    #[tokio::test]
    async fn test_settle_waits_for_writes() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        let writes = BackgroundWrites::default();

        for path in ["a.css", "b.js"] {
            let entry = CachedResponse::new(&format!("https://example.com/{path}"), 200, None, Vec::new(), b"x".to_vec());
            writes.put(store.clone(), entry).await;
        }

        assert_eq!(writes.settle().await, 2);
        assert_eq!(store.len().await.unwrap(), 2);
        assert_eq!(writes.settle().await, 0);
    }

    #[tokio::test]
    async fn test_finished_writes_are_reaped() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let store = storage.open_store("v1").await.unwrap();
        let writes = BackgroundWrites::default();

        for i in 0..5 {
            let entry = CachedResponse::new(&format!("https://example.com/{i}.png"), 200, None, Vec::new(), b"x".to_vec());
            writes.put(store.clone(), entry).await;
            while store.len().await.unwrap() < i + 1 {
                tokio::task::yield_now().await;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        assert!(writes.pending.lock().await.tasks.len() <= 1);
        assert_eq!(writes.settle().await, 5);
        assert_eq!(writes.settle().await, 0);
    }

    #[tokio::test]
    async fn test_failed_write_still_settles() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let writes = BackgroundWrites::default();
        let entry = CachedResponse::new("https://example.com/", 200, None, Vec::new(), b"x".to_vec());

        writes.put(storage.store("gone"), entry).await;

        assert_eq!(writes.settle().await, 1);
        assert!(!storage.has_store("gone").await.unwrap());
    }
}
