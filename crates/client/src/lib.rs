//! Network side of swcache.
//!
//! This crate provides the request model the worker routes on, the `Network`
//! seam it fetches through, and a reqwest-backed implementation of it.

pub mod fetch;
pub mod request;

pub use fetch::{FetchConfig, FetchResponse, HttpNetwork, Network, OfflineNetwork};
pub use request::{Request, RequestMode};

pub use reqwest::{Method, StatusCode, header};
