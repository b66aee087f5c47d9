//! In-process network double for worker tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use swcache_client::{FetchResponse, Network, Request, StatusCode};
use swcache_core::Error;
use url::Url;

pub(crate) const ORIGIN: &str = "https://svityazhome.example";

/// Absolute URL for `path` on the test origin.
pub(crate) fn url(path: &str) -> Url {
    Url::parse(ORIGIN).unwrap().join(path).unwrap()
}

/// Serves canned bodies by URL; anything unscripted is a 404.
#[derive(Debug, Default)]
pub(crate) struct ScriptedNetwork {
    routes: Mutex<HashMap<String, (u16, String)>>,
    /// URLs whose body exceeds the size limit.
    oversized: Mutex<Vec<String>>,
    delays: Mutex<HashMap<String, Duration>>,
    calls: Mutex<Vec<String>>,
    offline: AtomicBool,
}

impl ScriptedNetwork {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn offline() -> Self {
        let network = Self::default();
        network.set_offline(true);
        network
    }

    /// Answer `path` with `status` and `body`.
    pub(crate) fn with(self, path: &str, status: u16, body: &str) -> Self {
        self.route(path, status, body);
        self
    }

    pub(crate) fn route(&self, path: &str, status: u16, body: &str) {
        self.routes
            .lock()
            .unwrap()
            .insert(url(path).to_string(), (status, body.to_string()));
    }

    /// Reject `path` as too large while the network is up.
    pub(crate) fn with_oversized(self, path: &str) -> Self {
        self.oversized.lock().unwrap().push(url(path).to_string());
        self
    }

    /// Hold the answer for `path` back by `delay`.
    pub(crate) fn delay(&self, path: &str, delay: Duration) {
        self.delays.lock().unwrap().insert(url(path).to_string(), delay);
    }

    pub(crate) fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub(crate) fn calls_for(&self, path: &str) -> usize {
        let target = url(path).to_string();
        self.calls.lock().unwrap().iter().filter(|c| **c == target).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &Request) -> Result<FetchResponse, Error> {
        self.calls.lock().unwrap().push(request.url.to_string());

        let delay = self.delays.lock().unwrap().get(request.url.as_str()).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::Network(format!("offline: {}", request.url)));
        }
        if self.oversized.lock().unwrap().iter().any(|u| u == request.url.as_str()) {
            return Err(Error::FetchTooLarge(format!("{} exceeds the size limit", request.url)));
        }

        let (status, body) = self
            .routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or((404, "not found".to_string()));

        let status = StatusCode::from_u16(status).unwrap();
        Ok(FetchResponse::new(request.url.clone(), status, Some("text/html"), body))
    }
}
