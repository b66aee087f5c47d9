//! Install-time precaching.
//!
//! The whole manifest is fetched before anything is written, and the entries
//! are committed in one transaction. A single unreachable or non-2xx URL
//! fails the install and leaves no trace of the new version.

use crate::config::WorkerConfig;
use futures_util::{StreamExt, TryStreamExt, stream};
use swcache_client::{Network, Request};
use swcache_core::{CacheStorage, CachedResponse, Error};
use url::Url;

async fn fetch_entry(network: &dyn Network, url: &Url) -> Result<CachedResponse, Error> {
    let response = network.fetch(&Request::get(url.clone())).await?;
    if !response.is_success() {
        return Err(Error::HttpStatus { url: url.to_string(), status: response.status.as_u16() });
    }
    Ok(response.to_cached(url.as_str()))
}

/// Populate the store named by `config.version` with the manifest.
///
/// Returns the number of entries written.
///
/// # Errors
///
/// Returns `Error::InstallFailed` if any manifest URL cannot be fetched with
/// a 2xx status or the bulk insert fails. A store created by this call is
/// deleted again; a store that already existed keeps its previous contents.
pub async fn populate(config: &WorkerConfig, storage: &CacheStorage, network: &dyn Network) -> Result<usize, Error> {
    let version = config.version.as_str();
    let existed = storage.has_store(version).await?;
    let store = storage.open_store(version).await?;

    let result = async {
        let entries: Vec<CachedResponse> = stream::iter(config.manifest.iter())
            .map(|url| fetch_entry(network, url))
            .buffered(config.precache_concurrency.max(1))
            .try_collect()
            .await?;
        store.put_all(entries).await
    }
    .await;

    match result {
        Ok(count) => {
            tracing::info!(version, entries = count, "precache complete");
            Ok(count)
        }
        Err(e) => {
            if !existed && let Err(cleanup) = storage.delete_store(version).await {
                tracing::warn!(version, error = %cleanup, "failed to remove partial store");
            }
            tracing::error!(version, error = %e, "precache failed");
            Err(Error::InstallFailed { version: version.to_string(), reason: e.to_string() })
        }
    }
}
