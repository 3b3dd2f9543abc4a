use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[cfg(feature = "ts")]
use ts_rs::TS;

use super::lenient;
use crate::utils::{contains_ignore_case, truncate_preview};

/// Title shown for records saved without one
pub const UNTITLED: &str = "Untitled";

/// Number of body characters shown in list previews
pub const PREVIEW_CHARS: usize = 100;

/// Which collection a record lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Notes,
    Recipes,
}

impl CollectionKind {
    /// Storage key the collection is persisted under.
    pub fn storage_key(&self) -> &'static str {
        match self {
            CollectionKind::Notes => "pwa-notes-v1",
            CollectionKind::Recipes => "recipes-mk-v1",
        }
    }

    /// Default file name for an exported collection.
    pub fn export_file_name(&self) -> &'static str {
        match self {
            CollectionKind::Notes => "my-notes.json",
            CollectionKind::Recipes => "moirecepti.json",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CollectionKind::Notes => "notes",
            CollectionKind::Recipes => "recipes",
        }
    }
}

impl std::fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A note or a recipe.
///
/// Timestamps are milliseconds since the Unix epoch. Fields this crate does
/// not know about are kept in `extra` so imported files survive a round trip.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(TS), ts(export))]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default, deserialize_with = "lenient::string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub title: String,
    #[serde(default, deserialize_with = "lenient::string")]
    pub body: String,
    #[serde(default, deserialize_with = "lenient::millis")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub created_at: i64,
    #[serde(default, deserialize_with = "lenient::millis")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub updated_at: i64,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl Record {
    pub fn new(id: String, draft: RecordDraft, now: i64) -> Self {
        Self {
            id,
            title: draft.title,
            body: draft.body,
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }

    /// True when `updated_at` can be trusted for ordering.
    pub fn has_valid_updated_at(&self) -> bool {
        self.updated_at > 0
    }

    /// Case-insensitive substring match against title or body.
    pub fn matches(&self, query: &str) -> bool {
        contains_ignore_case(&self.title, query) || contains_ignore_case(&self.body, query)
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            UNTITLED
        } else {
            &self.title
        }
    }

    /// Body shortened for list display. Storage always keeps the full body.
    pub fn preview(&self) -> String {
        truncate_preview(&self.body, PREVIEW_CHARS)
    }
}

/// Fields supplied by the user when creating a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordDraft {
    pub title: String,
    pub body: String,
}

impl RecordDraft {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Fields changed by an edit. `None` leaves the field as it was.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordPatch {
    pub title: Option<String>,
    pub body: Option<String>,
}

impl RecordPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.body.is_none()
    }

    pub(crate) fn apply(self, record: &mut Record) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(body) = self.body {
            record.body = body;
        }
    }
}
