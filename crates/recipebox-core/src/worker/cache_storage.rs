//! Named response caches, keyed by request URL.
//!
//! Mirrors the browser's cache storage: any number of named caches, each a
//! map of URL to response. The worker only ever writes to one of them.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, warn};

use super::error::CacheError;
use super::http::Response;
use crate::utils::{decode_file_name, encode_file_name};

#[async_trait]
pub trait CacheStorage: Send + Sync {
    /// Create the named cache if it does not exist yet.
    async fn open(&self, name: &str) -> Result<(), CacheError>;

    /// Names of all caches.
    async fn keys(&self) -> Result<Vec<String>, CacheError>;

    /// Delete a cache and everything in it. Returns whether it existed.
    async fn delete(&self, name: &str) -> Result<bool, CacheError>;

    async fn match_in(&self, name: &str, url: &str) -> Result<Option<Response>, CacheError>;

    /// Store `response` under `url`, creating the cache if needed.
    async fn put(&self, name: &str, url: &str, response: Response) -> Result<(), CacheError>;

    /// URLs stored in the named cache.
    async fn entries(&self, name: &str) -> Result<Vec<String>, CacheError>;
}

type Caches = BTreeMap<String, BTreeMap<String, Response>>;

/// Process-local cache storage.
#[derive(Debug, Default)]
pub struct MemoryCacheStorage {
    caches: Mutex<Caches>,
}

impl MemoryCacheStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Caches> {
        self.caches.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl CacheStorage for MemoryCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        self.lock().entry(name.to_string()).or_default();
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        Ok(self.lock().keys().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        Ok(self.lock().remove(name).is_some())
    }

    async fn match_in(&self, name: &str, url: &str) -> Result<Option<Response>, CacheError> {
        Ok(self
            .lock()
            .get(name)
            .and_then(|cache| cache.get(url))
            .cloned())
    }

    async fn put(&self, name: &str, url: &str, response: Response) -> Result<(), CacheError> {
        self.lock()
            .entry(name.to_string())
            .or_default()
            .insert(url.to_string(), response);
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .lock()
            .get(name)
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default())
    }
}

/// A stored response along with when it was stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachedEntry {
    pub url: String,
    pub cached_at: DateTime<Utc>,
    pub response: Response,
}

/// Cache storage on disk: a directory per cache, a JSON file per entry.
///
/// Entry files are named by the BLAKE3 digest of the URL, so any URL fits
/// in a file name; the URL itself is kept inside the entry.
#[derive(Debug, Clone)]
pub struct FileCacheStorage {
    root: PathBuf,
}

impl FileCacheStorage {
    pub fn new(root: PathBuf) -> Result<Self, CacheError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn cache_dir(&self, name: &str) -> PathBuf {
        self.root.join(encode_file_name(name))
    }

    fn entry_path(&self, name: &str, url: &str) -> PathBuf {
        let digest = blake3::hash(url.as_bytes());
        self.cache_dir(name).join(format!("{}.json", digest.to_hex()))
    }

    /// Stored entry with its timestamp.
    pub async fn entry(&self, name: &str, url: &str) -> Result<Option<CachedEntry>, CacheError> {
        match fs::read_to_string(self.entry_path(name, url)).await {
            Ok(contents) => Ok(Some(serde_json::from_str(&contents)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl CacheStorage for FileCacheStorage {
    async fn open(&self, name: &str) -> Result<(), CacheError> {
        fs::create_dir_all(self.cache_dir(name)).await?;
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>, CacheError> {
        let mut names = Vec::new();
        let mut dir = fs::read_dir(&self.root).await?;
        while let Some(entry) = dir.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                if let Some(name) = entry.file_name().to_str().and_then(decode_file_name) {
                    names.push(name);
                }
            }
        }
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, CacheError> {
        match fs::remove_dir_all(self.cache_dir(name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn match_in(&self, name: &str, url: &str) -> Result<Option<Response>, CacheError> {
        Ok(self.entry(name, url).await?.map(|entry| entry.response))
    }

    async fn put(&self, name: &str, url: &str, response: Response) -> Result<(), CacheError> {
        self.open(name).await?;
        let entry = CachedEntry {
            url: url.to_string(),
            cached_at: Utc::now(),
            response,
        };
        let path = self.entry_path(name, url);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec(&entry)?).await?;
        fs::rename(&tmp, &path).await?;
        debug!(cache = name, url, "Stored cache entry");
        Ok(())
    }

    async fn entries(&self, name: &str) -> Result<Vec<String>, CacheError> {
        let mut dir = match fs::read_dir(self.cache_dir(name)).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut urls = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let contents = fs::read_to_string(&path).await?;
            match serde_json::from_str::<CachedEntry>(&contents) {
                Ok(cached) => urls.push(cached.url),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping corrupt cache entry"),
            }
        }
        urls.sort();
        Ok(urls)
    }
}
