//! Network-first serving for page navigations.
//!
//! Freshness wins for documents, but a navigation must always render
//! something offline: the last-seen copy of the page, else the shell.

use super::{ServeContext, Source, serve};
use crate::response::Response;
use swcache_client::Request;
use swcache_core::Error;

pub const NAVIGATION_CHAIN: &[Source] = &[Source::Network, Source::Cache, Source::Fallback];

pub(crate) async fn serve_navigation(request: &Request, ctx: &ServeContext<'_>) -> Result<Response, Error> {
    serve(NAVIGATION_CHAIN, request, ctx).await
}
