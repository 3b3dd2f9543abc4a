//! Pure operations over an in-memory record collection.
//!
//! Nothing here touches storage; `RecordStore` calls these and persists
//! the result. Collections are kept newest-first.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{IdGenerator, StoreError};
use crate::models::{Record, RecordDraft, RecordPatch};

/// How `import_merge` resolves an incoming record whose id already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// The incoming copy always replaces the existing one, even when its
    /// `updatedAt` is older. This is what shipped builds of the app do.
    #[default]
    IncomingWins,
    /// The incoming copy replaces the existing one only when its
    /// `updatedAt` is at least as new.
    NewerWins,
}

/// Sort newest-first by `updated_at`. The sort is stable, so records with
/// equal timestamps keep their collection order.
pub fn sort_newest_first(records: &mut [Record]) {
    records.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
}

/// Records whose title or body contains `query` (ignoring case), newest
/// first. An empty query returns every record.
pub fn list(records: &[Record], query: &str) -> Vec<Record> {
    let mut matched: Vec<Record> = records
        .iter()
        .filter(|r| query.is_empty() || r.matches(query))
        .cloned()
        .collect();
    sort_newest_first(&mut matched);
    matched
}

/// Create a record with a fresh id and prepend it to the collection.
pub fn create(
    collection: &mut Vec<Record>,
    draft: RecordDraft,
    now: i64,
    ids: &mut IdGenerator,
) -> Record {
    let id = ids.unique_for(collection);
    let record = Record::new(id, draft, now);
    collection.insert(0, record.clone());
    record
}

/// Apply `patch` to the record with `id` and refresh its `updated_at`.
pub fn update(
    collection: &mut [Record],
    id: &str,
    patch: RecordPatch,
    now: i64,
) -> Result<Record, StoreError> {
    let record = collection
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;

    patch.apply(record);
    // Never move backwards, even if the clock does
    record.updated_at = now.max(record.updated_at);
    Ok(record.clone())
}

/// Remove the record with `id`, returning it if it was present.
pub fn remove(collection: &mut Vec<Record>, id: &str) -> Option<Record> {
    let idx = collection.iter().position(|r| r.id == id)?;
    Some(collection.remove(idx))
}

/// Merge `incoming` into `existing` by id.
///
/// Incoming records without an id get one; those without a positive
/// `updated_at` are stamped with `now`. Existing records absent from
/// `incoming` are kept: import never deletes. The result is newest-first.
pub fn import_merge(
    existing: &[Record],
    incoming: Vec<Record>,
    policy: MergePolicy,
    now: i64,
    ids: &mut IdGenerator,
) -> Vec<Record> {
    let mut merged: Vec<Record> = existing.to_vec();
    let mut index: HashMap<String, usize> = merged
        .iter()
        .enumerate()
        .map(|(i, r)| (r.id.clone(), i))
        .collect();

    for mut record in incoming {
        if record.id.is_empty() {
            let taken: HashSet<&str> = index.keys().map(String::as_str).collect();
            record.id = ids.unique_id(&taken);
        }
        if !record.has_valid_updated_at() {
            record.updated_at = now;
        }

        match index.get(&record.id) {
            Some(&i) => {
                let replace = match policy {
                    MergePolicy::IncomingWins => true,
                    MergePolicy::NewerWins => record.updated_at >= merged[i].updated_at,
                };
                if replace {
                    merged[i] = record;
                }
            }
            None => {
                index.insert(record.id.clone(), merged.len());
                merged.push(record);
            }
        }
    }

    sort_newest_first(&mut merged);
    merged
}

/// Parse an import payload. The top level must be a JSON array.
pub fn parse_import(json: &str) -> Result<Vec<Record>, StoreError> {
    let value: Value = serde_json::from_str(json)?;
    if !value.is_array() {
        return Err(StoreError::NotAnArray);
    }
    Ok(serde_json::from_value(value)?)
}

/// Serialize a collection for export, pretty-printed with two-space indent.
pub fn export(records: &[Record]) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(records)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, title: &str, body: &str, updated_at: i64) -> Record {
        Record {
            id: id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            created_at: updated_at.min(1),
            updated_at,
            ..Record::default()
        }
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_list_empty_query_returns_all_newest_first() {
        let records = vec![
            record("a", "", "", 10),
            record("b", "", "", 30),
            record("c", "", "", 20),
        ];
        assert_eq!(ids(&list(&records, "")), vec!["b", "c", "a"]);
    }

    #[test]
    fn test_list_ties_keep_collection_order() {
        let records = vec![
            record("first", "", "", 5),
            record("second", "", "", 5),
            record("newest", "", "", 9),
        ];
        assert_eq!(ids(&list(&records, "")), vec!["newest", "first", "second"]);
    }

    #[test]
    fn test_list_filters_case_insensitively() {
        let records = vec![
            record("a", "Burek", "phyllo and cheese", 1),
            record("b", "Ajvar", "roasted PEPPERS", 2),
            record("c", "Pindjur", "tomato, pepper", 3),
            record("d", "Baklava", "walnuts", 4),
        ];
        assert_eq!(ids(&list(&records, "pepper")), vec!["c", "b"]);
        assert_eq!(ids(&list(&records, "BUREK")), vec!["a"]);
        assert!(list(&records, "zzz").is_empty());
    }

    #[test]
    fn test_create_prepends_with_matching_timestamps() {
        let mut collection = vec![record("old", "", "", 1)];
        let mut id_gen = IdGenerator::seeded(3);

        let created = create(&mut collection, RecordDraft::new("t", "b"), 500, &mut id_gen);
        assert_eq!(collection[0], created);
        assert_eq!(created.created_at, 500);
        assert_eq!(created.updated_at, 500);
        assert_ne!(created.id, "old");
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_update_refreshes_updated_at_only() {
        let mut collection = vec![Record {
            created_at: 100,
            ..record("a", "t", "b", 100)
        }];
        let patch = RecordPatch {
            title: Some("new title".into()),
            body: None,
        };

        let updated = update(&mut collection, "a", patch, 250).unwrap();
        assert_eq!(updated.title, "new title");
        assert_eq!(updated.body, "b");
        assert_eq!(updated.created_at, 100);
        assert_eq!(updated.updated_at, 250);
        assert_eq!(collection[0], updated);
    }

    #[test]
    fn test_update_never_moves_updated_at_backwards() {
        let mut collection = vec![record("a", "t", "b", 900)];
        let updated = update(&mut collection, "a", RecordPatch::default(), 100).unwrap();
        assert_eq!(updated.updated_at, 900);
    }

    #[test]
    fn test_update_missing_id_is_not_found() {
        let mut collection = vec![record("a", "t", "b", 1)];
        let err = update(&mut collection, "nope", RecordPatch::default(), 2).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(id) if id == "nope"));
        assert_eq!(collection[0].updated_at, 1);
    }

    #[test]
    fn test_remove() {
        let mut collection = vec![record("a", "", "", 1), record("b", "", "", 2)];
        assert_eq!(remove(&mut collection, "a").map(|r| r.id), Some("a".to_string()));
        assert!(remove(&mut collection, "a").is_none());
        assert_eq!(ids(&collection), vec!["b"]);
    }

    #[test]
    fn test_import_incoming_wins_even_when_older() {
        let existing = vec![record("a", "old", "", 100)];
        let incoming = vec![record("a", "new", "", 50)];

        let merged = import_merge(
            &existing,
            incoming,
            MergePolicy::IncomingWins,
            1_000,
            &mut IdGenerator::seeded(0),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "new");
        assert_eq!(merged[0].updated_at, 50);
    }

    #[test]
    fn test_import_newer_wins_keeps_newer_existing() {
        let existing = vec![record("a", "old", "", 100)];
        let incoming = vec![record("a", "stale", "", 50), record("b", "fresh", "", 60)];

        let merged = import_merge(
            &existing,
            incoming,
            MergePolicy::NewerWins,
            1_000,
            &mut IdGenerator::seeded(0),
        );
        assert_eq!(ids(&merged), vec!["a", "b"]);
        assert_eq!(merged[0].title, "old");
    }

    #[test]
    fn test_import_backfills_id_and_timestamp() {
        let existing = vec![record("a", "", "", 100), record("b", "", "", 200)];
        let incoming = vec![Record {
            title: "no id, no time".into(),
            ..Record::default()
        }];

        let merged = import_merge(
            &existing,
            incoming,
            MergePolicy::IncomingWins,
            5_000,
            &mut IdGenerator::seeded(9),
        );
        assert_eq!(merged.len(), 3);
        let imported = &merged[0];
        assert_eq!(imported.title, "no id, no time");
        assert_eq!(imported.updated_at, 5_000);
        assert!(merged[1..].iter().all(|r| r.updated_at < imported.updated_at));
        assert_eq!(imported.id.len(), 7);
        assert!(imported.id != "a" && imported.id != "b");
    }

    #[test]
    fn test_import_never_removes() {
        let existing = vec![record("a", "", "", 1), record("b", "", "", 2)];
        let merged = import_merge(
            &existing,
            vec![],
            MergePolicy::IncomingWins,
            3,
            &mut IdGenerator::seeded(0),
        );
        assert_eq!(ids(&merged), vec!["b", "a"]);
    }

    #[test]
    fn test_import_duplicate_ids_last_one_wins() {
        let incoming = vec![record("x", "first", "", 10), record("x", "second", "", 5)];
        let merged = import_merge(
            &[],
            incoming,
            MergePolicy::IncomingWins,
            100,
            &mut IdGenerator::seeded(0),
        );
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].title, "second");
    }

    #[test]
    fn test_parse_import_requires_array() {
        assert!(matches!(parse_import(r#"{"id":"a"}"#), Err(StoreError::NotAnArray)));
        assert!(matches!(parse_import("not json"), Err(StoreError::Parse(_))));
        assert!(matches!(parse_import("[1, 2]"), Err(StoreError::Parse(_))));
        assert_eq!(parse_import("[]").unwrap(), vec![]);
    }

    #[test]
    fn test_parse_import_tolerates_loose_fields() {
        let parsed = parse_import(r#"[{"id": 7, "title": "Sarma", "updatedAt": "1700000000000"}]"#).unwrap();
        assert_eq!(parsed[0].id, "7");
        assert_eq!(parsed[0].updated_at, 1_700_000_000_000);
        assert_eq!(parsed[0].body, "");
    }

    #[test]
    fn test_export_is_pretty_two_space() {
        let json = export(&[record("a", "t", "b", 1)]).unwrap();
        assert!(json.starts_with("[\n  {\n    \"id\": \"a\""));
        assert_eq!(parse_import(&json).unwrap()[0].id, "a");
    }
}
