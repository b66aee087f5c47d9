//! Activation-time removal of stale cache versions.

use futures_util::future::try_join_all;
use swcache_core::{CacheStorage, Error};

/// Delete every store except `current`. Returns the names removed.
pub async fn reap(storage: &CacheStorage, current: &str) -> Result<Vec<String>, Error> {
    let stale: Vec<String> = storage
        .store_names()
        .await?
        .into_iter()
        .filter(|name| name != current)
        .collect();

    try_join_all(stale.iter().map(|name| storage.delete_store(name))).await?;

    if !stale.is_empty() {
        tracing::info!(current, reaped = ?stale, "removed stale cache versions");
    }
    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_only_current_remains() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("v0").await.unwrap();
        storage.open_store("v1").await.unwrap();

        let reaped = reap(&storage, "v1").await.unwrap();

        assert_eq!(reaped, vec!["v0"]);
        assert_eq!(storage.store_names().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_nothing_to_reap() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("v1").await.unwrap();

        assert!(reap(&storage, "v1").await.unwrap().is_empty());
        assert_eq!(storage.store_names().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_reaps_foreign_stores_too() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        for name in ["svityazhome-v10", "svityazhome-v11", "other-app", "svityazhome-v12"] {
            storage.open_store(name).await.unwrap();
        }

        let reaped = reap(&storage, "svityazhome-v12").await.unwrap();

        assert_eq!(reaped.len(), 3);
        assert_eq!(storage.store_names().await.unwrap(), vec!["svityazhome-v12"]);
    }
}
