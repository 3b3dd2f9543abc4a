use serde::{Deserialize, Serialize};

/// Current cache version. Bump it to evict every older cache on the next
/// activation; there is no per-entry expiry.
pub const DEFAULT_CACHE_NAME: &str = "cooking-mk-v1";

pub const DEFAULT_OFFLINE_PAGE: &str = "/offline.html";

pub const DEFAULT_PLACEHOLDER_IMAGE: &str = "/logo.png";

pub const DEFAULT_ORIGIN: &str = "http://localhost:3000";

/// Fetched and stored unconditionally at install time.
pub const DEFAULT_PRECACHE: &[&str] = &[
    "/",
    DEFAULT_OFFLINE_PAGE,
    DEFAULT_PLACEHOLDER_IMAGE,
    "/angelina.jpg",
    "/moirecepti.json",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub cache_name: String,
    /// Origin relative request URLs are resolved against
    pub origin: String,
    pub precache: Vec<String>,
    /// Served to navigations when both network and cache fail
    pub offline_page: String,
    /// Served to image requests when both network and cache fail
    pub placeholder_image: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            cache_name: DEFAULT_CACHE_NAME.to_string(),
            origin: DEFAULT_ORIGIN.to_string(),
            precache: DEFAULT_PRECACHE.iter().map(|s| s.to_string()).collect(),
            offline_page: DEFAULT_OFFLINE_PAGE.to_string(),
            placeholder_image: DEFAULT_PLACEHOLDER_IMAGE.to_string(),
        }
    }
}
