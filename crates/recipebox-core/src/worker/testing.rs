//! Test doubles for the worker's network seam.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::error::NetworkError;
use super::http::{Request, Response};
use super::network::Network;

/// A fake origin: fixed responses per URL, 404 for anything else, and a
/// switch to simulate losing connectivity.
pub struct StubNetwork {
    routes: Mutex<HashMap<String, Response>>,
    hits: Mutex<HashMap<String, usize>>,
    online: AtomicBool,
}

impl StubNetwork {
    pub fn new() -> Self {
        Self {
            routes: Mutex::default(),
            hits: Mutex::default(),
            online: AtomicBool::new(true),
        }
    }

    pub fn serve(&self, url: &str, response: Response) {
        self.routes.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn forget(&self, url: &str) {
        self.routes.lock().unwrap().remove(url);
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Requests for `url` that reached the network.
    pub fn hits(&self, url: &str) -> usize {
        self.hits.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl Network for StubNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        if !self.online.load(Ordering::SeqCst) {
            return Err(NetworkError::Unreachable);
        }
        *self.hits.lock().unwrap().entry(request.url.clone()).or_default() += 1;
        Ok(self
            .routes
            .lock()
            .unwrap()
            .get(&request.url)
            .cloned()
            .unwrap_or_else(|| Response::new(404, "Not Found", Vec::new())))
    }
}
