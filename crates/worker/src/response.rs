//! Responses handed back to the page.

use bytes::Bytes;
use std::fmt;
use swcache_client::FetchResponse;
use swcache_core::CachedResponse;

/// Where a served response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseSource {
    Network,
    /// The cached copy of the requested URL.
    Cache,
    /// The cached shell document, served in place of the requested URL.
    Fallback,
}

impl fmt::Display for ResponseSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponseSource::Network => "network",
            ResponseSource::Cache => "cache",
            ResponseSource::Fallback => "fallback",
        })
    }
}

/// A response the worker answered a fetch with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// URL the body belongs to. For fallbacks this is the shell document,
    /// not the requested URL.
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
    pub source: ResponseSource,
}

impl Response {
    pub fn from_network(response: FetchResponse) -> Self {
        let headers = response
            .headers
            .iter()
            .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.to_string(), v.to_string())))
            .collect();
        Self {
            url: response.final_url.to_string(),
            status: response.status.as_u16(),
            content_type: response.content_type,
            headers,
            body: response.bytes,
            source: ResponseSource::Network,
        }
    }

    pub fn from_cache(entry: CachedResponse, source: ResponseSource) -> Self {
        Self {
            url: entry.url,
            status: entry.status,
            content_type: entry.content_type,
            headers: entry.headers,
            body: Bytes::from(entry.body),
            source,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
