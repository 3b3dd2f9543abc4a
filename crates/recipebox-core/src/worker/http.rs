//! Minimal request/response model seen by the offline worker.

use serde::{Deserialize, Serialize};

/// HTTP method. Only `GET` requests are ever matched against or written
/// into the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
    Put,
    Patch,
    Delete,
    Options,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
            Method::Options => "OPTIONS",
        }
    }
}

/// How the page issued the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestMode {
    /// Top-level page navigation
    Navigate,
    #[default]
    SameOrigin,
    Cors,
    NoCors,
}

/// What the response will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Destination {
    Document,
    Image,
    Script,
    Style,
    Font,
    Manifest,
    #[default]
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Path relative to the app origin (e.g. `/logo.png`) or an absolute URL
    pub url: String,
    pub mode: RequestMode,
    pub destination: Destination,
    /// Value of the `Accept` header, if sent
    pub accept: Option<String>,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            mode: RequestMode::default(),
            destination: Destination::default(),
            accept: None,
        }
    }

    /// A top-level page load.
    pub fn navigate(url: impl Into<String>) -> Self {
        Self {
            mode: RequestMode::Navigate,
            destination: Destination::Document,
            accept: Some("text/html,application/xhtml+xml,*/*;q=0.8".to_string()),
            ..Self::get(url)
        }
    }

    pub fn image(url: impl Into<String>) -> Self {
        Self {
            destination: Destination::Image,
            accept: Some("image/avif,image/webp,image/*,*/*;q=0.8".to_string()),
            ..Self::get(url)
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_mode(mut self, mode: RequestMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_accept(mut self, accept: impl Into<String>) -> Self {
        self.accept = Some(accept.into());
        self
    }

    /// Key the response is stored under, or `None` if the request can
    /// never be served from or written to the cache.
    pub fn cache_key(&self) -> Option<&str> {
        (self.method == Method::Get).then_some(self.url.as_str())
    }
}

/// Response type as a browser reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    /// Same-origin response
    #[default]
    Basic,
    /// Cross-origin response that passed CORS
    Cors,
    /// Cross-origin `no-cors` response: status and body are hidden
    Opaque,
    /// Synthesized locally rather than fetched
    Default,
    /// Network error
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub status: u16,
    pub status_text: String,
    pub kind: ResponseKind,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, status_text: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            kind: ResponseKind::Basic,
            content_type: None,
            body: body.into(),
        }
    }

    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self::new(200, "OK", body)
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_kind(mut self, kind: ResponseKind) -> Self {
        self.kind = kind;
        self
    }

    /// What a `no-cors` cross-origin fetch hands back.
    pub fn opaque() -> Self {
        Self::new(0, "", Vec::new()).with_kind(ResponseKind::Opaque)
    }

    /// Synthetic `504 Offline`, returned when neither network nor cache
    /// can answer.
    pub fn offline() -> Self {
        Self::new(504, "Offline", Vec::new()).with_kind(ResponseKind::Default)
    }

    /// A network error, as seen by a page the worker does not control.
    pub fn network_error() -> Self {
        Self::new(0, "", Vec::new()).with_kind(ResponseKind::Error)
    }

    /// Status in the 200-299 range.
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
