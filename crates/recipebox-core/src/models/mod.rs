//! Data models for notes and recipes.
//!
//! Notes and recipes share one shape, `Record`; `CollectionKind` picks the
//! storage key and export file name for each collection.

pub mod record;

mod lenient;

pub use record::{CollectionKind, Record, RecordDraft, RecordPatch};
