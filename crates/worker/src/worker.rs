//! A single cache version and its lifecycle handlers.

use std::sync::Arc;

use crate::config::WorkerConfig;
use crate::lifecycle::WorkerState;
use crate::response::Response;
use crate::router::{self, Route};
use crate::strategy::{ServeContext, cache_first, network_first};
use crate::writes::BackgroundWrites;
use crate::{precache, reaper};
use swcache_client::{Network, Request};
use swcache_core::{CacheStorage, CacheStore, Error};
use tokio::sync::RwLock;

/// Result of offering a request to the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The worker supplied the final response.
    Respond(Response),
    /// The worker did not intercept; the host should fetch normally.
    PassThrough,
}

/// One deployed version of the offline cache.
///
/// Reads and writes only ever touch the store named by its own version.
pub struct Worker {
    config: Arc<WorkerConfig>,
    storage: CacheStorage,
    network: Arc<dyn Network>,
    state: RwLock<WorkerState>,
    writes: BackgroundWrites,
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker").field("version", &self.config.version).finish_non_exhaustive()
    }
}

impl Worker {
    pub fn new(config: WorkerConfig, storage: CacheStorage, network: Arc<dyn Network>) -> Self {
        Self {
            config: Arc::new(config),
            storage,
            network,
            state: RwLock::new(WorkerState::Parsed),
            writes: BackgroundWrites::default(),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub async fn state(&self) -> WorkerState {
        *self.state.read().await
    }

    /// The store this worker reads from and writes to.
    pub fn store(&self) -> CacheStore {
        self.storage.store(&self.config.version)
    }

    async fn transition(&self, from: WorkerState, to: WorkerState) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if *state != from || !state.can_transition_to(to) {
            return Err(Error::InvalidState { expected: from.to_string(), actual: state.to_string() });
        }
        tracing::info!(version = %self.config.version, from = %from, to = %to, "worker state change");
        *state = to;
        Ok(())
    }

    /// Handle the install event: precache the manifest.
    ///
    /// On failure the worker becomes redundant and must not be activated.
    pub async fn install(&self) -> Result<usize, Error> {
        self.transition(WorkerState::Parsed, WorkerState::Installing).await?;

        match precache::populate(&self.config, &self.storage, self.network.as_ref()).await {
            Ok(count) => {
                self.transition(WorkerState::Installing, WorkerState::Installed).await?;
                Ok(count)
            }
            Err(e) => {
                self.retire().await;
                Err(e)
            }
        }
    }

    /// Handle the activate event: delete every other cache version.
    ///
    /// Fetches are not intercepted until this returns. If reaping fails the
    /// worker returns to Installed so activation can be retried.
    pub async fn activate(&self) -> Result<Vec<String>, Error> {
        self.transition(WorkerState::Installed, WorkerState::Activating).await?;

        match reaper::reap(&self.storage, &self.config.version).await {
            Ok(reaped) => {
                self.transition(WorkerState::Activating, WorkerState::Activated).await?;
                Ok(reaped)
            }
            Err(e) => {
                self.transition(WorkerState::Activating, WorkerState::Installed).await?;
                Err(e)
            }
        }
    }

    /// Mark a worker whose version was already active before a restart.
    pub(crate) async fn resume(&self) -> Result<(), Error> {
        self.transition(WorkerState::Parsed, WorkerState::Activated).await
    }

    /// Stop intercepting. Idempotent.
    pub(crate) async fn retire(&self) {
        let mut state = self.state.write().await;
        if state.can_transition_to(WorkerState::Redundant) {
            tracing::info!(version = %self.config.version, from = %*state, "worker redundant");
            *state = WorkerState::Redundant;
        }
    }

    /// Handle a fetch event.
    ///
    /// # Errors
    ///
    /// Only when no response could be produced at all: the network failed
    /// and the store could not supply the request or the fallback document.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        if !self.state.read().await.can_intercept_fetch() {
            return Ok(FetchOutcome::PassThrough);
        }

        let route = router::classify(request, &self.config.origin);
        tracing::debug!(method = %request.method, url = %request.url, ?route, "routing fetch");

        let store = self.store();
        let ctx = ServeContext {
            store: &store,
            network: self.network.as_ref(),
            fallback: &self.config.fallback,
            writes: &self.writes,
        };

        let response = match route {
            Route::PassThrough(_) => return Ok(FetchOutcome::PassThrough),
            Route::NetworkFirst => network_first::serve_navigation(request, &ctx).await?,
            Route::CacheFirst => cache_first::serve_asset(request, &ctx).await?,
        };
        Ok(FetchOutcome::Respond(response))
    }

    /// Wait for every background cache write started so far.
    pub async fn settle(&self) -> usize {
        self.writes.settle().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ResponseSource;
    use crate::testing::{ORIGIN, ScriptedNetwork, url};
    use swcache_client::Method;
    use url::Url;

    fn shell_network() -> Arc<ScriptedNetwork> {
        Arc::new(
            ScriptedNetwork::new()
                .with("/", 200, "home")
                .with("/index.html", 200, "shell")
                .with("/assets/css/style.css", 200, "body{}"),
        )
    }

    fn worker(version: &str, storage: &CacheStorage, network: Arc<ScriptedNetwork>) -> Worker {
        let config =
            WorkerConfig::new(version, ORIGIN, &["/", "/index.html", "/assets/css/style.css"], "/index.html").unwrap();
        Worker::new(config, storage.clone(), network)
    }

    async fn active_worker(storage: &CacheStorage, network: Arc<ScriptedNetwork>) -> Worker {
        let worker = worker("v1", storage, network);
        worker.install().await.unwrap();
        worker.activate().await.unwrap();
        worker
    }

    fn respond(outcome: FetchOutcome) -> Response {
        match outcome {
            FetchOutcome::Respond(response) => response,
            FetchOutcome::PassThrough => panic!("expected the worker to respond"),
        }
    }

    #[tokio::test]
    async fn test_install_then_activate() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let worker = worker("v1", &storage, shell_network());

        assert_eq!(worker.install().await.unwrap(), 3);
        assert_eq!(worker.state().await, WorkerState::Installed);

        worker.activate().await.unwrap();
        assert_eq!(worker.state().await, WorkerState::Activated);
    }

    #[tokio::test]
    async fn test_every_manifest_url_is_cached_after_install() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let worker = worker("v1", &storage, shell_network());
        worker.install().await.unwrap();

        for url in &worker.config().manifest {
            assert!(worker.store().match_url(url.as_str()).await.unwrap().is_some(), "{url} not cached");
        }
    }

    #[tokio::test]
    async fn test_failed_install_is_redundant() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = Arc::new(ScriptedNetwork::new().with("/", 200, "home"));
        let worker = worker("v1", &storage, network);

        assert!(worker.install().await.is_err());
        assert_eq!(worker.state().await, WorkerState::Redundant);
        assert!(matches!(worker.activate().await, Err(Error::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_activate_before_install_is_rejected() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let worker = worker("v1", &storage, shell_network());

        let result = worker.activate().await;
        assert!(matches!(result, Err(Error::InvalidState { ref actual, .. }) if actual == "parsed"));
    }

    #[tokio::test]
    async fn test_install_twice_is_rejected() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let worker = worker("v1", &storage, shell_network());
        worker.install().await.unwrap();

        assert!(matches!(worker.install().await, Err(Error::InvalidState { .. })));
    }

    #[tokio::test]
    async fn test_activate_reaps_old_versions() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        storage.open_store("v0").await.unwrap();
        let worker = worker("v1", &storage, shell_network());
        worker.install().await.unwrap();

        let reaped = worker.activate().await.unwrap();

        assert_eq!(reaped, vec!["v0"]);
        assert_eq!(storage.store_names().await.unwrap(), vec!["v1"]);
    }

    #[tokio::test]
    async fn test_not_intercepting_before_activation() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let worker = worker("v1", &storage, shell_network());
        worker.install().await.unwrap();

        let outcome = worker.handle_fetch(&Request::get(url("/assets/css/style.css"))).await.unwrap();
        assert_eq!(outcome, FetchOutcome::PassThrough);
    }

    #[tokio::test]
    async fn test_non_get_and_cross_origin_pass_through() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = shell_network();
        let worker = active_worker(&storage, network.clone()).await;
        let calls_after_install = network.total_calls();

        let post = Request::navigate(url("/booking/")).with_method(Method::POST);
        let cross = Request::get(Url::parse("https://maps.example.net/embed").unwrap());

        assert_eq!(worker.handle_fetch(&post).await.unwrap(), FetchOutcome::PassThrough);
        assert_eq!(worker.handle_fetch(&cross).await.unwrap(), FetchOutcome::PassThrough);
        assert_eq!(network.total_calls(), calls_after_install);
        assert_eq!(worker.settle().await, 0);
    }

    #[tokio::test]
    async fn test_precached_asset_served_without_network() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = shell_network();
        let worker = active_worker(&storage, network.clone()).await;
        network.set_offline(true);

        let response = respond(worker.handle_fetch(&Request::get(url("/assets/css/style.css"))).await.unwrap());

        assert_eq!(response.source, ResponseSource::Cache);
        assert_eq!(&response.body[..], b"body{}");
        assert_eq!(network.calls_for("/assets/css/style.css"), 1);
    }

    #[tokio::test]
    async fn test_visited_page_survives_going_offline() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = shell_network();
        network.route("/about/", 200, "about us");
        let worker = active_worker(&storage, network.clone()).await;

        let online = respond(worker.handle_fetch(&Request::navigate(url("/about/"))).await.unwrap());
        assert_eq!(online.source, ResponseSource::Network);
        worker.settle().await;

        network.set_offline(true);
        let offline = respond(worker.handle_fetch(&Request::navigate(url("/about/"))).await.unwrap());
        assert_eq!(offline.source, ResponseSource::Cache);
        assert_eq!(&offline.body[..], b"about us");

        let unvisited = respond(worker.handle_fetch(&Request::navigate(url("/new-page/"))).await.unwrap());
        assert_eq!(unvisited.source, ResponseSource::Fallback);
        assert_eq!(&unvisited.body[..], b"shell");
    }

    #[tokio::test]
    async fn test_redundant_worker_stops_intercepting() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let worker = active_worker(&storage, shell_network()).await;

        worker.retire().await;
        worker.retire().await;

        assert_eq!(worker.state().await, WorkerState::Redundant);
        let outcome = worker.handle_fetch(&Request::get(url("/assets/css/style.css"))).await.unwrap();
        assert_eq!(outcome, FetchOutcome::PassThrough);
    }

    #[tokio::test]
    async fn test_concurrent_fetches() {
        let storage = CacheStorage::open_in_memory().await.unwrap();
        let network = shell_network();
        for i in 0..8 {
            network.route(&format!("/assets/images/room-{i}.jpg"), 200, &format!("room {i}"));
        }
        let worker = Arc::new(active_worker(&storage, network.clone()).await);

        let mut handles = Vec::new();
        for i in 0..8 {
            let worker = worker.clone();
            handles.push(tokio::spawn(async move {
                let request = Request::get(url(&format!("/assets/images/room-{i}.jpg")));
                worker.handle_fetch(&request).await
            }));
        }
        for handle in handles {
            let response = respond(handle.await.unwrap().unwrap());
            assert_eq!(response.source, ResponseSource::Network);
        }

        assert_eq!(worker.settle().await, 8);
        assert_eq!(worker.store().len().await.unwrap(), 3 + 8);
    }
}
