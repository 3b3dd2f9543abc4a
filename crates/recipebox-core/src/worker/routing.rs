//! Per-request routing decisions, free of any I/O.
//!
//! `OfflineWorker::handle_fetch` asks `route` what to do and then carries
//! it out against the cache and the network.

use super::http::{Destination, Method, Request, RequestMode, Response, ResponseKind};

/// What the worker knows about the cache before routing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Hit,
    Miss,
    /// Not looked up; navigations don't consult the cache up front
    Unchecked,
}

/// How to answer a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Network, refreshing the cache on success. On failure the cached copy
    /// of the request, then the offline page, then a synthetic 504.
    NetworkFirst,
    /// Answer from the cache without touching the network.
    ServeCached,
    /// Fetch, store a cacheable response, and fall back as given on failure.
    FetchAndCache { on_failure: Fallback },
}

/// Answer for a cache-first miss whose network fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    /// The cached placeholder image
    Placeholder,
    /// Synthetic `504 Offline`
    GatewayTimeout,
}

/// A page navigation, or a GET that accepts HTML.
pub fn is_navigation(request: &Request) -> bool {
    request.mode == RequestMode::Navigate
        || (request.method == Method::Get
            && request
                .accept
                .as_deref()
                .is_some_and(|accept| accept.contains("text/html")))
}

/// Whether a fetched response may be stored: status 200 and not opaque.
pub fn is_cacheable(response: &Response) -> bool {
    response.status == 200
        && !matches!(response.kind, ResponseKind::Opaque | ResponseKind::Error)
}

pub fn route(request: &Request, cache: CacheState) -> Decision {
    if is_navigation(request) {
        return Decision::NetworkFirst;
    }
    if cache == CacheState::Hit {
        return Decision::ServeCached;
    }
    let on_failure = if request.destination == Destination::Image {
        Fallback::Placeholder
    } else {
        Fallback::GatewayTimeout
    };
    Decision::FetchAndCache { on_failure }
}
