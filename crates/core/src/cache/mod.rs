//! SQLite-backed storage for versioned response caches.
//!
//! This module provides the persistent side of the worker: a set of named
//! cache stores (one per deployed version) holding response snapshots keyed by
//! request URL. It supports:
//!
//! - Idempotent open-by-name, enumerate and delete of whole stores
//! - Atomic bulk insert for precaching
//! - Automatic schema migrations
//! - WAL mode for concurrent readers

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod registrations;
pub mod stores;

pub use crate::Error;

pub use connection::CacheStorage;
pub use entries::CachedResponse;
pub use stores::CacheStore;
