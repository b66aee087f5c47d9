//! Intercepted request model.

use reqwest::Method;
use reqwest::header::HeaderMap;
use swcache_core::cache::hash::entry_key;
use url::Url;

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level document load.
    Navigate,
    SameOrigin,
    #[default]
    NoCors,
    Cors,
}

/// A request as seen by the worker.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    pub mode: RequestMode,
    pub headers: HeaderMap,
}

impl Request {
    /// A subresource GET (image, script, stylesheet).
    pub fn get(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::NoCors, headers: HeaderMap::new() }
    }

    /// A top-level page navigation.
    pub fn navigate(url: Url) -> Self {
        Self { method: Method::GET, url, mode: RequestMode::Navigate, headers: HeaderMap::new() }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn is_navigation(&self) -> bool {
        self.mode == RequestMode::Navigate
    }

    /// Key under which a response to this request is cached.
    pub fn cache_key(&self) -> &str {
        entry_key(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_defaults() {
        let req = Request::get(Url::parse("https://example.com/assets/css/style.css").unwrap());
        assert_eq!(req.method, Method::GET);
        assert_eq!(req.mode, RequestMode::NoCors);
        assert!(!req.is_navigation());
    }

    #[test]
    fn test_navigate() {
        let req = Request::navigate(Url::parse("https://example.com/about/").unwrap());
        assert!(req.is_navigation());
    }

    #[test]
    fn test_with_method() {
        let req = Request::get(Url::parse("https://example.com/booking/").unwrap()).with_method(Method::POST);
        assert_eq!(req.method, Method::POST);
    }

    #[test]
    fn test_cache_key_drops_fragment() {
        let req = Request::navigate(Url::parse("https://example.com/rooms/?view=grid#suite").unwrap());
        assert_eq!(req.cache_key(), "https://example.com/rooms/?view=grid");
    }
}
