use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::collection::{self, MergePolicy};
use super::{Clock, IdGenerator, StorageBackend, StorageError, StoreError, SystemClock};
use crate::models::{CollectionKind, Record, RecordDraft, RecordPatch};

/// Read the collection persisted under `key`.
///
/// A missing entry is an empty collection. A payload that is not a JSON
/// array of records is an error; `RecordStore::open` turns that into an
/// empty store.
pub fn load_records<B: StorageBackend>(backend: &B, key: &str) -> Result<Vec<Record>, StoreError> {
    let Some(raw) = backend.get(key)? else {
        return Ok(Vec::new());
    };
    let value: Value = serde_json::from_str(&raw)?;
    if !value.is_array() {
        return Err(StoreError::NotAnArray);
    }
    Ok(serde_json::from_value(value)?)
}

/// A record collection kept in memory and written through to a backend
/// after every mutation.
///
/// The in-memory collection is the source of truth for the session: a
/// failed write is logged and remembered, never rolled back.
pub struct RecordStore<B: StorageBackend> {
    backend: B,
    key: String,
    records: Vec<Record>,
    clock: Arc<dyn Clock>,
    ids: IdGenerator,
    policy: MergePolicy,
    load_error: Option<StoreError>,
    last_persist_error: Option<StorageError>,
}

impl<B: StorageBackend> RecordStore<B> {
    /// Open the collection under `key`, loading whatever is persisted.
    pub fn open(backend: B, key: impl Into<String>) -> Self {
        let key = key.into();
        let (records, load_error) = match load_records(&backend, &key) {
            Ok(records) => {
                debug!(key = %key, count = records.len(), "Loaded records");
                (records, None)
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to load records, starting empty");
                (Vec::new(), Some(e))
            }
        };

        Self {
            backend,
            key,
            records,
            clock: Arc::new(SystemClock),
            ids: IdGenerator::new(),
            policy: MergePolicy::default(),
            load_error,
            last_persist_error: None,
        }
    }

    pub fn open_kind(backend: B, kind: CollectionKind) -> Self {
        Self::open(backend, kind.storage_key())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_ids(mut self, ids: IdGenerator) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_policy(mut self, policy: MergePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn policy(&self) -> MergePolicy {
        self.policy
    }

    /// Records in collection order (newest-created first).
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Why the initial load fell back to an empty collection, if it did.
    pub fn load_error(&self) -> Option<&StoreError> {
        self.load_error.as_ref()
    }

    /// The most recent write failure, cleared by the next successful write.
    pub fn last_persist_error(&self) -> Option<&StorageError> {
        self.last_persist_error.as_ref()
    }

    pub fn list(&self, query: &str) -> Vec<Record> {
        collection::list(&self.records, query)
    }

    pub fn create(&mut self, draft: RecordDraft) -> Record {
        let now = self.clock.now_millis();
        let record = collection::create(&mut self.records, draft, now, &mut self.ids);
        debug!(key = %self.key, id = %record.id, "Created record");
        self.persist();
        record
    }

    pub fn update(&mut self, id: &str, patch: RecordPatch) -> Result<Record, StoreError> {
        let now = self.clock.now_millis();
        let record = collection::update(&mut self.records, id, patch, now)?;
        debug!(key = %self.key, id, "Updated record");
        self.persist();
        Ok(record)
    }

    pub fn remove(&mut self, id: &str) -> Option<Record> {
        let removed = collection::remove(&mut self.records, id)?;
        debug!(key = %self.key, id, "Removed record");
        self.persist();
        Some(removed)
    }

    /// Merge already-parsed records into the collection.
    pub fn import_records(&mut self, incoming: Vec<Record>) -> usize {
        let count = incoming.len();
        let now = self.clock.now_millis();
        self.records =
            collection::import_merge(&self.records, incoming, self.policy, now, &mut self.ids);
        info!(key = %self.key, imported = count, total = self.records.len(), "Imported records");
        self.persist();
        count
    }

    /// Parse and merge an import payload. On error nothing changes.
    pub fn import_json(&mut self, json: &str) -> Result<usize, StoreError> {
        let incoming = collection::parse_import(json)?;
        Ok(self.import_records(incoming))
    }

    pub fn import_from(&mut self, path: &Path) -> Result<usize, StoreError> {
        let json = std::fs::read_to_string(path).map_err(|source| StoreError::File {
            path: path.to_path_buf(),
            source,
        })?;
        self.import_json(&json)
    }

    pub fn export_json(&self) -> Result<String, StoreError> {
        collection::export(&self.records)
    }

    pub fn export_to(&self, path: &Path) -> Result<(), StoreError> {
        let json = self.export_json()?;
        std::fs::write(path, json).map_err(|source| StoreError::File {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Write the whole collection to the backend.
    ///
    /// Called after every mutation. Failures are logged and kept in
    /// `last_persist_error`; there is no retry.
    pub fn persist(&mut self) -> Option<&StorageError> {
        let result = serde_json::to_string(&self.records)
            .map_err(|e| StorageError::Io(e.into()))
            .and_then(|payload| self.backend.set(&self.key, &payload));

        match result {
            Ok(()) => {
                self.last_persist_error = None;
            }
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to save records");
                self.last_persist_error = Some(e);
            }
        }
        self.last_persist_error.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{ManualClock, MemoryBackend};

    fn store_at<'a>(
        backend: &'a MemoryBackend,
        clock: &Arc<ManualClock>,
    ) -> RecordStore<&'a MemoryBackend> {
        RecordStore::open(backend, "pwa-notes-v1")
            .with_clock(clock.clone())
            .with_ids(IdGenerator::seeded(42))
    }

    #[test]
    fn test_open_missing_key_is_empty() {
        let backend = MemoryBackend::new();
        let store = RecordStore::open(&backend, "pwa-notes-v1");
        assert!(store.is_empty());
        assert!(store.load_error().is_none());
    }

    #[test]
    fn test_open_corrupt_payload_is_empty_with_error() {
        let backend = MemoryBackend::new();
        backend.set("pwa-notes-v1", "{not json").unwrap();
        let store = RecordStore::open(&backend, "pwa-notes-v1");
        assert!(store.is_empty());
        assert!(matches!(store.load_error(), Some(StoreError::Parse(_))));

        backend.set("pwa-notes-v1", r#"{"id":"a"}"#).unwrap();
        let store = RecordStore::open(&backend, "pwa-notes-v1");
        assert!(store.is_empty());
        assert!(matches!(store.load_error(), Some(StoreError::NotAnArray)));
    }

    #[test]
    fn test_create_then_load_round_trips() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(1_000));
        let mut store = store_at(&backend, &clock);

        let created = store.create(RecordDraft::new("Musaka", "potatoes, mince"));

        let loaded = load_records(&backend, "pwa-notes-v1").unwrap();
        assert_eq!(loaded, vec![created.clone()]);
        assert_eq!(loaded[0].created_at, 1_000);
        assert_eq!(loaded[0].updated_at, 1_000);

        let reopened = RecordStore::open(&backend, "pwa-notes-v1");
        assert_eq!(reopened.get(&created.id), Some(&created));
    }

    #[test]
    fn test_update_persists_and_keeps_created_at() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(1_000));
        let mut store = store_at(&backend, &clock);
        let created = store.create(RecordDraft::new("a", "b"));

        clock.advance(50);
        let updated = store
            .update(&created.id, RecordPatch { title: Some("c".into()), body: None })
            .unwrap();
        assert_eq!(updated.created_at, 1_000);
        assert_eq!(updated.updated_at, 1_050);
        assert_eq!(load_records(&backend, "pwa-notes-v1").unwrap()[0].title, "c");
    }

    #[test]
    fn test_update_unknown_id_does_not_write() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(1));
        let mut store = store_at(&backend, &clock);
        let err = store.update("missing", RecordPatch::default()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
        assert_eq!(backend.get("pwa-notes-v1").unwrap(), None);
    }

    #[test]
    fn test_remove_persists() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(1));
        let mut store = store_at(&backend, &clock);
        let a = store.create(RecordDraft::new("a", ""));
        let b = store.create(RecordDraft::new("b", ""));

        assert!(store.remove(&a.id).is_some());
        assert!(store.remove(&a.id).is_none());
        assert_eq!(load_records(&backend, "pwa-notes-v1").unwrap(), vec![b]);
    }

    #[test]
    fn test_failed_write_keeps_memory_state() {
        let backend = MemoryBackend::with_quota(64);
        let clock = Arc::new(ManualClock::new(1));
        let mut store = store_at(&backend, &clock);

        let big = store.create(RecordDraft::new("big", "x".repeat(200)));
        assert!(matches!(
            store.last_persist_error(),
            Some(StorageError::QuotaExceeded { .. })
        ));
        assert_eq!(store.get(&big.id), Some(&big));
        assert_eq!(backend.get("pwa-notes-v1").unwrap(), None);

        store.remove(&big.id);
        assert!(store.last_persist_error().is_none());
        assert_eq!(backend.get("pwa-notes-v1").unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_import_json_merges_and_persists() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(10_000));
        let mut store = store_at(&backend, &clock);
        let existing = store.create(RecordDraft::new("old", ""));

        let payload = format!(
            r#"[{{"id":"{}","title":"new","updatedAt":5}},{{"title":"fresh"}}]"#,
            existing.id
        );
        assert_eq!(store.import_json(&payload).unwrap(), 2);

        let titles: Vec<&str> = store.records().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["fresh", "new"]);
        assert_eq!(load_records(&backend, "pwa-notes-v1").unwrap().len(), 2);
    }

    #[test]
    fn test_import_json_with_newer_wins_policy() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(10_000));
        let mut store = store_at(&backend, &clock).with_policy(MergePolicy::NewerWins);
        let existing = store.create(RecordDraft::new("old", ""));

        let payload = format!(r#"[{{"id":"{}","title":"new","updatedAt":5}}]"#, existing.id);
        store.import_json(&payload).unwrap();
        assert_eq!(store.get(&existing.id).unwrap().title, "old");
    }

    #[test]
    fn test_import_non_array_leaves_state() {
        let backend = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(1));
        let mut store = store_at(&backend, &clock);
        store.create(RecordDraft::new("keep", ""));
        let before = backend.get("pwa-notes-v1").unwrap();

        let err = store.import_json(r#"{"notes": []}"#).unwrap_err();
        assert!(matches!(err, StoreError::NotAnArray));
        assert_eq!(store.len(), 1);
        assert_eq!(backend.get("pwa-notes-v1").unwrap(), before);
    }

    #[test]
    fn test_export_and_import_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CollectionKind::Notes.export_file_name());

        let source = MemoryBackend::new();
        let clock = Arc::new(ManualClock::new(7));
        let mut store = store_at(&source, &clock);
        store.create(RecordDraft::new("exported", "body"));
        store.export_to(&path).unwrap();

        let target = MemoryBackend::new();
        let mut other = RecordStore::open(&target, "pwa-notes-v1");
        assert_eq!(other.import_from(&path).unwrap(), 1);
        assert_eq!(other.records(), store.records());

        let err = other.import_from(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, StoreError::File { .. }));
    }

    #[test]
    fn test_custom_key_with_spaces_persists_to_files() {
        let dir = tempfile::tempdir().unwrap();
        let backend = crate::store::FileBackend::new(dir.path().to_path_buf()).unwrap();

        let mut store = RecordStore::open(&backend, "my notes");
        let created = store.create(RecordDraft::new("Pastrmajlija", "flatbread"));
        assert!(store.last_persist_error().is_none());

        let reopened = RecordStore::open(&backend, "my notes");
        assert!(reopened.load_error().is_none());
        assert_eq!(reopened.get(&created.id), Some(&created));
    }
}
