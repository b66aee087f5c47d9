//! Cache-first serving for static assets.
//!
//! Assets are versioned by store name rather than URL, so a cached copy is
//! always served as-is; staleness is resolved by bumping the version.

use super::{ServeContext, Source, serve};
use crate::response::Response;
use swcache_client::Request;
use swcache_core::Error;

pub const ASSET_CHAIN: &[Source] = &[Source::Cache, Source::Network, Source::Fallback];

pub(crate) async fn serve_asset(request: &Request, ctx: &ServeContext<'_>) -> Result<Response, Error> {
    serve(ASSET_CHAIN, request, ctx).await
}
