//! Core types and shared functionality for swcache.
//!
//! This crate provides:
//! - Versioned cache storage with SQLite backend
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheStorage, CacheStore, CachedResponse};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
