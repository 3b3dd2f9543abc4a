//! The worker's view of the network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, Url};
use tracing::debug;

use super::error::NetworkError;
use super::http::{Method, Request, RequestMode, Response, ResponseKind};

/// HTTP request timeout in seconds.
/// Past this the worker treats the fetch as failed and falls back to cache.
const REQUEST_TIMEOUT_SECS: u64 = 15;

#[async_trait]
pub trait Network: Send + Sync {
    /// Perform the request. `Err` means the fetch itself failed (offline,
    /// DNS, timeout); any HTTP status, including errors, is `Ok`.
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}

#[async_trait]
impl<N: Network + ?Sized> Network for &N {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        (**self).fetch(request).await
    }
}

/// Fetches over HTTP, resolving relative URLs against the app origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: &str) -> Result<Self, NetworkError> {
        let origin = Url::parse(origin).map_err(|e| NetworkError::InvalidUrl {
            url: origin.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;
        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn resolve(&self, url: &str) -> Result<Url, NetworkError> {
        self.origin.join(url).map_err(|e| NetworkError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

fn to_reqwest_method(method: &Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Head => reqwest::Method::HEAD,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
        Method::Options => reqwest::Method::OPTIONS,
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = self.resolve(&request.url)?;
        let same_origin = url.origin() == self.origin.origin();

        let mut builder = self.client.request(to_reqwest_method(&request.method), url.clone());
        if let Some(accept) = &request.accept {
            builder = builder.header(header::ACCEPT, accept);
        }
        let res = builder.send().await?;

        // A no-cors cross-origin fetch never exposes status or body
        if !same_origin && request.mode == RequestMode::NoCors {
            debug!(url = %url, "Opaque response");
            return Ok(Response::opaque());
        }

        let status = res.status();
        let content_type = res
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = res.bytes().await?.to_vec();
        debug!(url = %url, status = status.as_u16(), bytes = body.len(), "Fetched");

        Ok(Response {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            kind: if same_origin {
                ResponseKind::Basic
            } else {
                ResponseKind::Cors
            },
            content_type,
            body,
        })
    }
}
