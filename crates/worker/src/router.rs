//! Request classification.

use swcache_client::fetch::is_same_origin;
use swcache_client::{Method, Request};
use url::Url;

/// What the worker does with an intercepted request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Not intercepted; the host performs the request unmodified.
    PassThrough(PassReason),
    /// Top-level navigation: network, then cache, then the shell document.
    NetworkFirst,
    /// Same-origin subresource: cache, then network, then the shell document.
    CacheFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassReason {
    NotGet,
    CrossOrigin,
}

/// Decide how `request` is served by a worker registered on `origin`.
pub fn classify(request: &Request, origin: &Url) -> Route {
    if request.method != Method::GET {
        return Route::PassThrough(PassReason::NotGet);
    }
    if !is_same_origin(&request.url, origin) {
        return Route::PassThrough(PassReason::CrossOrigin);
    }
    if request.is_navigation() { Route::NetworkFirst } else { Route::CacheFirst }
}
