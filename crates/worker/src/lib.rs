//! The offline cache worker.
//!
//! A [`Worker`] owns one cache version. Its lifecycle is driven by a
//! [`Registration`]:
//!
//! - **install** precaches the manifest into the store named by the version
//! - **activate** reaps every other store and takes control of clients
//! - **fetch** routes same-origin GETs to network-first (navigations) or
//!   cache-first (everything else) serving, falling back to the shell document
//!   when the network is unreachable

pub mod config;
pub mod lifecycle;
pub mod precache;
pub mod reaper;
pub mod registration;
pub mod response;
pub mod router;
pub mod strategy;
pub mod worker;
mod writes;

#[cfg(test)]
pub(crate) mod testing;

pub use config::WorkerConfig;
pub use lifecycle::WorkerState;
pub use registration::{ClientId, Registration};
pub use response::{Response, ResponseSource};
pub use router::{PassReason, Route};
pub use worker::{FetchOutcome, Worker};
