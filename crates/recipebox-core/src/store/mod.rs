//! Local persistence for note and recipe collections.
//!
//! A collection lives under a single storage key as a JSON array of
//! `Record`s. `RecordStore` keeps it in memory, writes it through to an
//! injected `StorageBackend` after every mutation, and merges imports.
//!
//! Backends:
//! - `MemoryBackend`: process-local, optional byte quota
//! - `FileBackend`: one `<key>.json` file per collection in a data directory

pub mod backend;
pub mod clock;
pub mod collection;
pub mod error;
pub mod manager;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use clock::{Clock, IdGenerator, ManualClock, SystemClock};
pub use collection::MergePolicy;
pub use error::{StorageError, StoreError};
pub use manager::{load_records, RecordStore};
