//! The registration that owns the installing, waiting and active workers of
//! a scope, and the clients they control.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::lifecycle::WorkerState;
use crate::worker::{FetchOutcome, Worker};
use swcache_client::Request;
use swcache_core::{CacheStorage, Error};
use tokio::sync::RwLock;
use url::Url;

/// A page controlled (or not yet controlled) by the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClientId(u64);

impl fmt::Display for ClientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "client-{}", self.0)
    }
}

#[derive(Default)]
struct Slots {
    active: Option<Arc<Worker>>,
    waiting: Option<Arc<Worker>>,
    /// Client id to the version that controls it.
    clients: BTreeMap<ClientId, Option<String>>,
}

impl Slots {
    fn has_controlled_clients(&self) -> bool {
        self.clients.values().any(Option::is_some)
    }
}

/// Worker slots for one scope.
///
/// Slot changes happen under the write lock. Fetches only take the lock long
/// enough to pick the active worker.
pub struct Registration {
    scope: Url,
    storage: CacheStorage,
    slots: RwLock<Slots>,
    next_client: AtomicU64,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration").field("scope", &self.scope.as_str()).finish_non_exhaustive()
    }
}

impl Registration {
    pub fn new(scope: Url, storage: CacheStorage) -> Self {
        Self { scope, storage, slots: RwLock::new(Slots::default()), next_client: AtomicU64::new(1) }
    }

    pub fn scope(&self) -> &Url {
        &self.scope
    }

    pub async fn active(&self) -> Option<Arc<Worker>> {
        self.slots.read().await.active.clone()
    }

    pub async fn waiting(&self) -> Option<Arc<Worker>> {
        self.slots.read().await.waiting.clone()
    }

    /// Install `worker` and, unless it has to wait, activate it.
    ///
    /// A worker waits when skip-waiting is off and an older worker still
    /// controls clients; it is activated once the last client disconnects.
    ///
    /// # Errors
    ///
    /// Install and activation failures. The previously active worker keeps
    /// serving in both cases.
    pub async fn register(&self, worker: Worker) -> Result<Arc<Worker>, Error> {
        let worker = Arc::new(worker);
        tracing::info!(scope = %self.scope, version = worker.version(), "registering worker");

        worker.install().await?;

        let mut slots = self.slots.write().await;
        let must_wait = !worker.config().skip_waiting && slots.active.is_some() && slots.has_controlled_clients();
        if must_wait {
            if let Some(replaced) = slots.waiting.replace(worker.clone()) {
                replaced.retire().await;
            }
            tracing::info!(scope = %self.scope, version = worker.version(), "worker waiting for clients to close");
            return Ok(worker);
        }

        self.promote(&mut slots, worker.clone()).await?;
        Ok(worker)
    }

    async fn promote(&self, slots: &mut Slots, worker: Arc<Worker>) -> Result<(), Error> {
        worker.activate().await?;

        let version = worker.version().to_string();
        if let Some(previous) = slots.active.replace(worker.clone()) {
            previous.retire().await;
        }
        if let Some(waiting) = slots.waiting.take()
            && !Arc::ptr_eq(&waiting, &worker)
        {
            waiting.retire().await;
        }
        self.storage.record_active(self.scope.as_str(), &version).await?;

        let claim = worker.config().claim_clients;
        for controller in slots.clients.values_mut() {
            if claim || controller.is_some() {
                *controller = Some(version.clone());
            }
        }
        tracing::info!(scope = %self.scope, version = %version, clients = slots.clients.len(), "worker active");
        Ok(())
    }

    /// Resume a worker that was active for this scope before a restart.
    ///
    /// Returns `None` when the persisted version differs or its store is gone;
    /// the caller should [`register`](Self::register) instead.
    pub async fn restore(&self, worker: Worker) -> Result<Option<Arc<Worker>>, Error> {
        let persisted = self.storage.active_version(self.scope.as_str()).await?;
        if persisted.as_deref() != Some(worker.version()) || !self.storage.has_store(worker.version()).await? {
            tracing::debug!(scope = %self.scope, ?persisted, version = worker.version(), "nothing to restore");
            return Ok(None);
        }

        let worker = Arc::new(worker);
        worker.resume().await?;

        let mut slots = self.slots.write().await;
        if let Some(previous) = slots.active.replace(worker.clone()) {
            previous.retire().await;
        }
        tracing::info!(scope = %self.scope, version = worker.version(), "worker restored");
        Ok(Some(worker))
    }

    /// Connect a page. It is controlled by the active worker, if any.
    pub async fn connect_client(&self) -> ClientId {
        let id = ClientId(self.next_client.fetch_add(1, Ordering::Relaxed));
        let mut slots = self.slots.write().await;
        let controller = slots.active.as_ref().map(|w| w.version().to_string());
        slots.clients.insert(id, controller);
        id
    }

    /// Disconnect a page, activating a waiting worker once no page is
    /// controlled by the old one.
    pub async fn disconnect_client(&self, id: ClientId) -> Result<bool, Error> {
        let mut slots = self.slots.write().await;
        if slots.clients.remove(&id).is_none() {
            return Ok(false);
        }

        if !slots.has_controlled_clients()
            && let Some(waiting) = slots.waiting.clone()
        {
            self.promote(&mut slots, waiting).await?;
        }
        Ok(true)
    }

    /// Version controlling `id`, if any.
    pub async fn controller(&self, id: ClientId) -> Option<String> {
        self.slots.read().await.clients.get(&id).cloned().flatten()
    }

    /// Offer a request to the active worker.
    ///
    /// The slot lock is released before serving. A worker replaced while the
    /// request is in flight finishes it against its own, possibly reaped,
    /// store.
    pub async fn handle_fetch(&self, request: &Request) -> Result<FetchOutcome, Error> {
        match self.active().await {
            Some(worker) => worker.handle_fetch(request).await,
            None => Ok(FetchOutcome::PassThrough),
        }
    }

    /// Wait for the active worker's pending cache writes.
    pub async fn settle(&self) -> usize {
        match self.active().await {
            Some(worker) => worker.settle().await,
            None => 0,
        }
    }

    /// Drop every worker and forget the persisted active version.
    ///
    /// Stores are left in place; deleting them is up to the caller.
    pub async fn unregister(&self) -> Result<bool, Error> {
        let mut slots = self.slots.write().await;
        for worker in [slots.active.take(), slots.waiting.take()].into_iter().flatten() {
            worker.settle().await;
            worker.retire().await;
        }
        for controller in slots.clients.values_mut() {
            *controller = None;
        }
        let cleared = self.storage.clear_registration(self.scope.as_str()).await?;
        tracing::info!(scope = %self.scope, cleared, "unregistered");
        Ok(cleared)
    }

    /// State of the active worker, if there is one.
    pub async fn active_state(&self) -> Option<WorkerState> {
        match self.active().await {
            Some(worker) => Some(worker.state().await),
            None => None,
        }
    }
}
