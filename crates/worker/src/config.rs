//! Immutable per-version worker configuration.

use swcache_client::fetch::{UrlError, parse_origin, resolve_path};
use swcache_core::{AppConfig, Error};
use url::Url;

/// Everything a worker version needs, resolved against its origin.
///
/// Built once at startup and never mutated; deploying different values
/// means constructing a worker with a new `version`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    pub version: String,
    pub origin: Url,
    /// Absolute URLs to precache, in manifest order, without duplicates.
    pub manifest: Vec<Url>,
    /// The shell document served when nothing better is available.
    pub fallback: Url,
    pub precache_concurrency: usize,
    pub skip_waiting: bool,
    pub claim_clients: bool,
}

fn url_error(err: UrlError) -> Error {
    Error::InvalidUrl(err.to_string())
}

impl WorkerConfig {
    /// Resolve `manifest` and `fallback_path` against `origin`.
    ///
    /// Defaults: precache concurrency 6, skip-waiting and client claiming on.
    pub fn new(version: &str, origin: &str, manifest: &[&str], fallback_path: &str) -> Result<Self, Error> {
        if version.trim().is_empty() {
            return Err(Error::InvalidInput("cache version cannot be empty".into()));
        }

        let origin = parse_origin(origin).map_err(url_error)?;

        let mut resolved: Vec<Url> = Vec::with_capacity(manifest.len());
        for path in manifest {
            let url = resolve_path(&origin, path).map_err(url_error)?;
            if !resolved.contains(&url) {
                resolved.push(url);
            }
        }

        let fallback = resolve_path(&origin, fallback_path).map_err(url_error)?;
        if !resolved.contains(&fallback) {
            return Err(Error::InvalidInput(format!("fallback {fallback_path} is not in the precache manifest")));
        }

        Ok(Self {
            version: version.to_string(),
            origin,
            manifest: resolved,
            fallback,
            precache_concurrency: 6,
            skip_waiting: true,
            claim_clients: true,
        })
    }

    /// Build from the loaded application configuration.
    pub fn from_app(app: &AppConfig) -> Result<Self, Error> {
        let manifest: Vec<&str> = app.precache.iter().map(String::as_str).collect();
        let mut config = Self::new(&app.cache_version, &app.origin, &manifest, &app.fallback_path)?;
        config.precache_concurrency = app.precache_concurrency.max(1);
        config.skip_waiting = app.skip_waiting;
        config.claim_clients = app.claim_clients;
        Ok(config)
    }

    /// Resolve a path on this worker's origin.
    pub fn url_for(&self, path: &str) -> Result<Url, Error> {
        resolve_path(&self.origin, path).map_err(url_error)
    }
}
