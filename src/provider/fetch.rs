//! Upstream fetcher: reads the active HTTP routers of one upstream proxy.
//!
//! [`HttpFetcher`] issues `GET {apiHost}/api/http/routers`, with HTTP
//! Basic authentication when credentials are configured, and decodes the
//! JSON array in the response body. Each call is independent: no retry,
//! no backoff and no caching. Failures come back as [`FetchError`] and
//! are handled by the caller.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use http::header::{ACCEPT, AUTHORIZATION};
use http::{HeaderValue, Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;
use serde::Deserialize;

use crate::config::model::{Credentials, InstanceConfig};
use crate::error::FetchError;

/// Path of the upstream's router listing, relative to `apiHost`.
pub const ROUTERS_PATH: &str = "/api/http/routers";

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, Full<Bytes>>;

/// A router as listed by the upstream API. Only `rule` is used; every
/// other field the upstream reports is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FetchedRoute {
    pub rule: String,
}

// async_trait is required here because RouteFetcher is used as Arc<dyn RouteFetcher>
// and native async fn in traits does not support dyn dispatch.
#[async_trait]
pub trait RouteFetcher: Send + Sync {
    async fn fetch(&self, instance: &InstanceConfig) -> Result<Vec<FetchedRoute>, FetchError>;
}

#[must_use]
pub fn build_http_client() -> HttpClient {
    // Both `ring` and `aws-lc-rs` may be compiled in; pick one explicitly.
    let _ = rustls::crypto::ring::default_provider().install_default();

    let https = hyper_rustls::HttpsConnectorBuilder::new()
        .with_webpki_roots()
        .https_or_http()
        .enable_http1()
        .build();
    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(30))
        .build(https)
}

/// `Authorization` header value for the given credentials, or `None` when
/// both username and password are empty.
#[must_use]
pub fn basic_auth_header(credentials: &Credentials) -> Option<HeaderValue> {
    if credentials.is_empty() {
        return None;
    }
    let encoded = STANDARD.encode(format!(
        "{}:{}",
        credentials.username, credentials.password
    ));
    let mut value = HeaderValue::from_str(&format!("Basic {encoded}")).ok()?;
    value.set_sensitive(true);
    Some(value)
}

#[must_use]
pub fn routers_url(api_host: &str) -> String {
    format!("{}{ROUTERS_PATH}", api_host.trim_end_matches('/'))
}

/// Fetches routers over HTTP(S) with a per-request timeout.
#[derive(Clone)]
pub struct HttpFetcher {
    client: HttpClient,
    timeout: Duration,
}

impl HttpFetcher {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self::with_client(build_http_client(), timeout)
    }

    #[must_use]
    pub const fn with_client(client: HttpClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    /// Fetch routers from `host`, authenticating when `credentials` is non-empty.
    pub async fn fetch_routers(
        &self,
        host: &str,
        credentials: Option<&Credentials>,
    ) -> Result<Vec<FetchedRoute>, FetchError> {
        let url = routers_url(host);
        let uri: hyper::Uri = url.parse().map_err(|e: http::uri::InvalidUri| {
            FetchError::InvalidHost {
                host: host.to_string(),
                source: Box::new(e),
            }
        })?;

        let mut builder = hyper::Request::builder()
            .method(Method::GET)
            .uri(uri)
            .header(ACCEPT, "application/json");
        if let Some(value) = credentials.and_then(basic_auth_header) {
            builder = builder.header(AUTHORIZATION, value);
        }
        let req = builder
            .body(Full::new(Bytes::new()))
            .map_err(|e| FetchError::InvalidHost {
                host: host.to_string(),
                source: Box::new(e),
            })?;

        let start = Instant::now();
        let response = tokio::time::timeout(self.timeout, self.client.request(req))
            .await
            .map_err(|_| FetchError::Unreachable {
                url: url.clone(),
                source: format!("request timed out after {}ms", self.timeout.as_millis()).into(),
            })?
            .map_err(|e| FetchError::Unreachable {
                url: url.clone(),
                source: Box::new(e),
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Rejected { url, status });
        }

        let body = tokio::time::timeout(self.timeout, response.into_body().collect())
            .await
            .map_err(|_| FetchError::Unreachable {
                url: url.clone(),
                source: "timed out reading response body".into(),
            })?
            .map_err(|e| FetchError::Unreachable {
                url: url.clone(),
                source: Box::new(e),
            })?
            .to_bytes();

        let routes: Vec<FetchedRoute> =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                url: url.clone(),
                source,
            })?;

        tracing::debug!(
            url = %url,
            routers = routes.len(),
            latency_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
            "fetched upstream routers"
        );

        Ok(routes)
    }
}

#[async_trait]
impl RouteFetcher for HttpFetcher {
    async fn fetch(&self, instance: &InstanceConfig) -> Result<Vec<FetchedRoute>, FetchError> {
        self.fetch_routers(&instance.api_host, instance.credentials.as_ref())
            .await
    }
}
