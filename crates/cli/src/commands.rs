use std::sync::Arc;

use anyhow::{Context, Result, bail};
use serde_json::json;
use swcache_client::{FetchConfig, HttpNetwork, Method, Network, OfflineNetwork, Request};
use swcache_core::{AppConfig, CacheStorage};
use swcache_worker::{FetchOutcome, Registration, Worker, WorkerConfig};
use tokio::io::AsyncWriteExt;
use url::Url;

async fn open_storage(config: &AppConfig) -> Result<CacheStorage> {
    CacheStorage::open(&config.db_path)
        .await
        .with_context(|| format!("opening cache database {}", config.db_path.display()))
}

fn network(config: &AppConfig, offline: bool) -> Result<Arc<dyn Network>> {
    if offline {
        return Ok(Arc::new(OfflineNetwork));
    }
    Ok(Arc::new(HttpNetwork::new(FetchConfig::from(config))?))
}

pub async fn register(config: &AppConfig) -> Result<()> {
    let worker_config = WorkerConfig::from_app(config)?;
    let storage = open_storage(config).await?;
    let registration = Registration::new(worker_config.origin.clone(), storage.clone());

    let worker = Worker::new(worker_config, storage, network(config, false)?);
    let worker = registration.register(worker).await?;

    let summary = json!({
        "scope": registration.scope().as_str(),
        "version": worker.version(),
        "state": worker.state().await.to_string(),
        "entries": worker.store().len().await?,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

/// Build the request `swcache fetch` serves. `path` is either an absolute
/// URL or a path on the configured origin.
fn request_for(worker_config: &WorkerConfig, path: &str, navigate: bool, method: &str) -> Result<Request> {
    let url = if path.starts_with("http://") || path.starts_with("https://") {
        Url::parse(path).with_context(|| format!("invalid URL {path}"))?
    } else {
        worker_config.url_for(path)?
    };
    let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .with_context(|| format!("invalid method {method}"))?;

    let request = if navigate { Request::navigate(url) } else { Request::get(url) };
    Ok(request.with_method(method))
}

/// Delete every cache store, returning the names removed.
async fn purge_stores(storage: &CacheStorage) -> Result<Vec<String>> {
    let mut deleted = Vec::new();
    for name in storage.store_names().await? {
        if storage.delete_store(&name).await? {
            deleted.push(name);
        }
    }
    Ok(deleted)
}

pub async fn fetch(config: &AppConfig, path: &str, navigate: bool, method: &str, offline: bool) -> Result<()> {
    let worker_config = WorkerConfig::from_app(config)?;
    let request = request_for(&worker_config, path, navigate, method)?;

    let storage = open_storage(config).await?;
    let network = network(config, offline)?;
    let registration = Registration::new(worker_config.origin.clone(), storage.clone());
    let worker = Worker::new(worker_config, storage, network.clone());
    if registration.restore(worker).await?.is_none() {
        bail!("no active worker for {}; run `swcache register` first", registration.scope());
    }

    let outcome = registration.handle_fetch(&request).await;
    registration.settle().await;

    let (status, source, body) = match outcome? {
        FetchOutcome::Respond(response) => (response.status, response.source.to_string(), response.body),
        FetchOutcome::PassThrough => {
            let response = network.fetch(&request).await?;
            (response.status.as_u16(), "passthrough".to_string(), response.bytes)
        }
    };
    eprintln!("{status} {} ({source})", request.url);

    let mut stdout = tokio::io::stdout();
    stdout.write_all(&body).await?;
    stdout.flush().await?;
    Ok(())
}

pub async fn caches(config: &AppConfig) -> Result<()> {
    let worker_config = WorkerConfig::from_app(config)?;
    let storage = open_storage(config).await?;
    let active = storage.active_version(worker_config.origin.as_str()).await?;

    for name in storage.store_names().await? {
        let marker = if active.as_deref() == Some(name.as_str()) { "*" } else { " " };
        println!("{marker} {name}");
    }
    Ok(())
}

pub async fn entries(config: &AppConfig, store: Option<&str>) -> Result<()> {
    let name = store.unwrap_or(&config.cache_version);
    let storage = open_storage(config).await?;
    if !storage.has_store(name).await? {
        bail!("no cache store named {name}");
    }

    for key in storage.store(name).keys().await? {
        println!("{key}");
    }
    Ok(())
}

pub fn print_config(config: &AppConfig) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

pub async fn unregister(config: &AppConfig, purge: bool) -> Result<()> {
    let worker_config = WorkerConfig::from_app(config)?;
    let storage = open_storage(config).await?;
    let registration = Registration::new(worker_config.origin, storage.clone());

    let cleared = registration.unregister().await?;
    let deleted = if purge { purge_stores(&storage).await? } else { Vec::new() };

    let summary = json!({ "scope": registration.scope().as_str(), "cleared": cleared, "deleted": deleted });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
