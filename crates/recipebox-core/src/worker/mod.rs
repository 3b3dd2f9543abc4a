//! Offline cache worker.
//!
//! Keeps one versioned cache of static assets and decides, per request,
//! whether to answer from the cache, the network, or a fallback:
//!
//! - navigations are network-first (cached copy, then the offline page)
//! - everything else is cache-first (placeholder image or `504 Offline`)
//!
//! Routing is the pure `routing::route`; `OfflineWorker` carries it out
//! against a `CacheStorage` and a `Network`.

pub mod cache_storage;
pub mod config;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod network;
pub mod routing;

#[cfg(test)]
pub(crate) mod testing;

pub use cache_storage::{CacheStorage, FileCacheStorage, MemoryCacheStorage};
pub use config::WorkerConfig;
pub use error::{CacheError, NetworkError, WorkerError};
pub use http::{Destination, Method, Request, RequestMode, Response, ResponseKind};
pub use lifecycle::{OfflineWorker, WorkerState};
pub use network::{HttpNetwork, Network};
pub use routing::{is_cacheable, is_navigation, route, CacheState, Decision, Fallback};
