//! Serving strategies as explicit fallback chains.
//!
//! Each strategy is an ordered list of sources. The chain is walked until a
//! source produces a usable response:
//!
//! - `Network`: a 2xx answer is returned and stored in the background; a
//!   non-2xx answer is held as a degraded response and never stored
//! - `Cache`: the entry stored for the request URL
//! - `Fallback`: the shell document, tried only if the network could not be
//!   reached at all
//!
//! When the chain is exhausted the held degraded response is returned, or the
//! network error if there is none. Network errors other than an unreachable
//! network (an oversized body, say) never arm the fallback.

pub mod cache_first;
pub mod network_first;

use crate::response::{Response, ResponseSource};
use crate::writes::BackgroundWrites;
use swcache_client::{Network, Request};
use swcache_core::{CacheStore, Error};
use url::Url;

pub use cache_first::ASSET_CHAIN;
pub use network_first::NAVIGATION_CHAIN;

/// One step of a fallback chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Network,
    Cache,
    Fallback,
}

/// What a strategy needs from the worker for one request.
pub(crate) struct ServeContext<'a> {
    pub store: &'a CacheStore,
    pub network: &'a dyn Network,
    pub fallback: &'a Url,
    pub writes: &'a BackgroundWrites,
}

/// Walk `chain` for `request`.
pub(crate) async fn serve(chain: &[Source], request: &Request, ctx: &ServeContext<'_>) -> Result<Response, Error> {
    let mut degraded: Option<Response> = None;
    let mut network_error: Option<Error> = None;

    for source in chain {
        match source {
            Source::Network => match ctx.network.fetch(request).await {
                Ok(fetched) if fetched.is_success() => {
                    let entry = fetched.to_cached(request.cache_key());
                    ctx.writes.put(ctx.store.clone(), entry).await;
                    return Ok(Response::from_network(fetched));
                }
                Ok(fetched) => {
                    tracing::debug!(url = %request.url, status = fetched.status.as_u16(), "not caching non-2xx response");
                    degraded = Some(Response::from_network(fetched));
                }
                Err(e) => {
                    if e.is_network_failure() {
                        tracing::debug!(url = %request.url, error = %e, "network unreachable");
                    } else {
                        tracing::warn!(url = %request.url, error = %e, "network fetch failed");
                    }
                    network_error = Some(e);
                }
            },
            Source::Cache => match ctx.store.match_url(request.cache_key()).await {
                Ok(Some(entry)) => {
                    tracing::debug!(url = %request.url, store = ctx.store.name(), "cache hit");
                    return Ok(Response::from_cache(entry, ResponseSource::Cache));
                }
                Ok(None) => tracing::debug!(url = %request.url, "cache miss"),
                Err(e) => return Err(network_error.unwrap_or(e)),
            },
            Source::Fallback => {
                let skip_fallback = degraded.is_some() || network_error.as_ref().is_some_and(|e| !e.is_network_failure());
                if skip_fallback {
                    continue;
                }
                match ctx.store.match_url(ctx.fallback.as_str()).await {
                    Ok(Some(entry)) => {
                        tracing::warn!(url = %request.url, fallback = %ctx.fallback, "serving offline fallback");
                        return Ok(Response::from_cache(entry, ResponseSource::Fallback));
                    }
                    Ok(None) => tracing::warn!(fallback = %ctx.fallback, "fallback document is not cached"),
                    Err(e) => return Err(network_error.unwrap_or(e)),
                }
            }
        }
    }

    if let Some(response) = degraded {
        return Ok(response);
    }
    Err(network_error.unwrap_or_else(|| Error::NoResponse(request.url.to_string())))
}
