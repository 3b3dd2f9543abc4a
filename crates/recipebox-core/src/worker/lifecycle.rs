use futures::future::try_join_all;
use tracing::{debug, info, warn};

use super::cache_storage::CacheStorage;
use super::config::WorkerConfig;
use super::error::{CacheError, WorkerError};
use super::http::{Request, Response};
use super::network::Network;
use super::routing::{is_cacheable, is_navigation, route, CacheState, Decision, Fallback};

/// Lifecycle of one worker version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    /// Install failed; this version will never control a page
    Redundant,
}

/// The offline cache worker: one versioned cache, a precache manifest, and
/// per-request routing between cache and network.
pub struct OfflineWorker<C: CacheStorage, N: Network> {
    config: WorkerConfig,
    caches: C,
    network: N,
    state: WorkerState,
    skip_waiting: bool,
    clients_claimed: bool,
}

impl<C: CacheStorage, N: Network> OfflineWorker<C, N> {
    pub fn new(config: WorkerConfig, caches: C, network: N) -> Self {
        Self {
            config,
            caches,
            network,
            state: WorkerState::Parsed,
            skip_waiting: false,
            clients_claimed: false,
        }
    }

    /// A worker that was installed and activated by an earlier run and is
    /// now being restarted against its existing cache.
    pub fn resume(config: WorkerConfig, caches: C, network: N) -> Self {
        Self {
            state: WorkerState::Activated,
            skip_waiting: true,
            clients_claimed: true,
            ..Self::new(config, caches, network)
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn caches(&self) -> &C {
        &self.caches
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    pub fn skips_waiting(&self) -> bool {
        self.skip_waiting
    }

    pub fn controls_clients(&self) -> bool {
        self.clients_claimed
    }

    /// Fetch every precache URL and store them all.
    ///
    /// Any network failure or non-2xx response fails the install and
    /// nothing is stored. The worker then becomes `Redundant`.
    pub async fn install(&mut self) -> Result<(), WorkerError> {
        if self.state != WorkerState::Parsed {
            return Err(WorkerError::InvalidState {
                action: "install",
                state: self.state,
            });
        }
        self.state = WorkerState::Installing;
        info!(cache = %self.config.cache_name, assets = self.config.precache.len(), "Installing");

        match self.precache().await {
            Ok(()) => {
                self.state = WorkerState::Installed;
                self.skip_waiting = true;
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Install failed");
                self.state = WorkerState::Redundant;
                Err(e)
            }
        }
    }

    async fn precache(&self) -> Result<(), WorkerError> {
        self.caches.open(&self.config.cache_name).await?;

        let fetches = self
            .config
            .precache
            .iter()
            .map(|url| async move { self.precache_one(url).await.map(|res| (url, res)) });
        let responses = try_join_all(fetches).await?;

        for (url, response) in responses {
            self.caches.put(&self.config.cache_name, url, response).await?;
        }
        Ok(())
    }

    async fn precache_one(&self, url: &str) -> Result<Response, WorkerError> {
        let response = self
            .network
            .fetch(&Request::get(url))
            .await
            .map_err(|source| WorkerError::InstallFetch {
                url: url.to_string(),
                source,
            })?;
        if !response.is_ok() {
            return Err(WorkerError::InstallStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        debug!(url, bytes = response.body.len(), "Precached");
        Ok(response)
    }

    /// Delete every cache except the current version and take control of
    /// open pages. Returns the names of the deleted caches.
    ///
    /// Failing to evict a stale cache does not stop activation; the failure
    /// is logged and the cache is left for the next version to clean up.
    pub async fn activate(&mut self) -> Result<Vec<String>, WorkerError> {
        if self.state != WorkerState::Installed {
            return Err(WorkerError::InvalidState {
                action: "activate",
                state: self.state,
            });
        }
        self.state = WorkerState::Activating;

        let deleted = match self.evict_stale().await {
            Ok(deleted) => deleted,
            Err((deleted, e)) => {
                warn!(error = %e, "Failed to evict stale caches");
                deleted
            }
        };

        self.clients_claimed = true;
        self.state = WorkerState::Activated;
        info!(cache = %self.config.cache_name, "Activated");
        Ok(deleted)
    }

    /// Delete caches other than the current one. On error, also hands back
    /// the names deleted before the failure.
    async fn evict_stale(&self) -> Result<Vec<String>, (Vec<String>, CacheError)> {
        let mut deleted = Vec::new();
        let names = match self.caches.keys().await {
            Ok(names) => names,
            Err(e) => return Err((deleted, e)),
        };
        for name in names {
            if name == self.config.cache_name {
                continue;
            }
            if let Err(e) = self.caches.delete(&name).await {
                return Err((deleted, e));
            }
            info!(cache = %name, "Deleted stale cache");
            deleted.push(name);
        }
        Ok(deleted)
    }

    /// Answer a request from the page. Never fails: every failure path ends
    /// in a cached copy, a fallback asset, or a synthetic `504 Offline`.
    pub async fn handle_fetch(&self, request: &Request) -> Response {
        if self.state != WorkerState::Activated {
            // Not in control yet, the page talks to the network directly
            return match self.network.fetch(request).await {
                Ok(response) => response,
                Err(_) => Response::network_error(),
            };
        }

        let (cache_state, cached) = if is_navigation(request) {
            (CacheState::Unchecked, None)
        } else {
            match self.lookup(request).await {
                Some(response) => (CacheState::Hit, Some(response)),
                None => (CacheState::Miss, None),
            }
        };

        match (route(request, cache_state), cached) {
            (Decision::NetworkFirst, _) => self.network_first(request).await,
            (Decision::ServeCached, Some(response)) => {
                debug!(url = %request.url, "Cache hit");
                response
            }
            (Decision::ServeCached, None) => {
                self.fetch_and_cache(request, Fallback::GatewayTimeout).await
            }
            (Decision::FetchAndCache { on_failure }, _) => {
                self.fetch_and_cache(request, on_failure).await
            }
        }
    }

    async fn network_first(&self, request: &Request) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Navigation offline, trying cache");
                if let Some(cached) = self.lookup(request).await {
                    return cached;
                }
                if let Some(page) = self.lookup_url(&self.config.offline_page).await {
                    return page;
                }
                warn!(page = %self.config.offline_page, "Offline page missing from cache");
                Response::offline()
            }
        }
    }

    async fn fetch_and_cache(&self, request: &Request, on_failure: Fallback) -> Response {
        match self.network.fetch(request).await {
            Ok(response) => {
                self.store(request, &response).await;
                response
            }
            Err(e) => {
                debug!(url = %request.url, error = %e, "Fetch failed, using fallback");
                match on_failure {
                    Fallback::Placeholder => self
                        .lookup_url(&self.config.placeholder_image)
                        .await
                        .unwrap_or_else(Response::offline),
                    Fallback::GatewayTimeout => Response::offline(),
                }
            }
        }
    }

    async fn lookup(&self, request: &Request) -> Option<Response> {
        self.lookup_url(request.cache_key()?).await
    }

    async fn lookup_url(&self, url: &str) -> Option<Response> {
        match self.caches.match_in(&self.config.cache_name, url).await {
            Ok(found) => found,
            Err(e) => {
                warn!(url, error = %e, "Cache lookup failed");
                None
            }
        }
    }

    /// Best-effort cache write; failures are logged and otherwise ignored.
    async fn store(&self, request: &Request, response: &Response) {
        let Some(key) = request.cache_key() else {
            return;
        };
        if !is_cacheable(response) {
            debug!(url = key, status = response.status, kind = ?response.kind, "Not caching");
            return;
        }
        if let Err(e) = self
            .caches
            .put(&self.config.cache_name, key, response.clone())
            .await
        {
            warn!(url = key, error = %e, "Failed to update cache");
        }
    }
}
