//! Core library for recipebox.
//!
//! - [`models`]: the `Record` type shared by notes and recipes
//! - [`store`]: persistence of record collections behind a pluggable backend
//! - [`worker`]: the offline cache worker (precache, stale cache cleanup,
//!   network-first and cache-first request handling)
//! - [`utils`]: small string helpers used for search and display

pub mod models;
pub mod store;
pub mod utils;
pub mod worker;

pub use models::{CollectionKind, Record, RecordDraft, RecordPatch};
pub use store::{MergePolicy, RecordStore, StorageBackend, StoreError};
pub use worker::{OfflineWorker, WorkerConfig, WorkerError};
