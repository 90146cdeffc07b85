//! Shared HTTPS client construction and the [`HttpFetch`] seam.
//!
//! One pooled hyper client serves both consumers of the network: the
//! remote configuration source (conditional GET) and the speed probe
//! (HEAD). [`HttpFetch`] narrows the client to exactly those two
//! operations so tests can substitute a fake.

use std::time::Duration;

use async_trait::async_trait;
use http_body_util::BodyExt;
use http_body_util::Full;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::error::MirrorSwitchError;

pub type HttpsConnector =
    hyper_rustls::HttpsConnector<hyper_util::client::legacy::connect::HttpConnector>;
pub type HttpClient = Client<HttpsConnector, http_body_util::Full<bytes::Bytes>>;

#[must_use]
pub fn build_http_client() -> HttpClient {
    // When multiple rustls crypto providers are compiled in, rustls cannot
    // auto-detect which one to use. Explicitly install `ring`.
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

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub etag: Option<String>,
    pub last_modified: Option<String>,
    pub body: String,
}

#[async_trait]
pub trait HttpFetch: Send + Sync {
    /// GET with optional `If-None-Match`, bounded by `timeout`.
    async fn get(
        &self,
        url: &str,
        if_none_match: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchResponse, MirrorSwitchError>;

    /// HEAD returning only the status code, bounded by `timeout`.
    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, MirrorSwitchError>;
}

pub struct HyperFetch {
    client: HttpClient,
}

impl HyperFetch {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    async fn request(
        &self,
        method: hyper::Method,
        url: &str,
        if_none_match: Option<&str>,
        timeout: Duration,
    ) -> Result<hyper::Response<hyper::body::Incoming>, MirrorSwitchError> {
        let mut builder = hyper::Request::builder()
            .method(method)
            .uri(url)
            .header(hyper::header::USER_AGENT, concat!("mirrorswitch/", env!("CARGO_PKG_VERSION")));

        if let Some(etag) = if_none_match {
            builder = builder.header(hyper::header::IF_NONE_MATCH, etag);
        }

        let request = builder
            .body(Full::new(bytes::Bytes::new()))
            .map_err(MirrorSwitchError::network)?;

        match tokio::time::timeout(timeout, self.client.request(request)).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(MirrorSwitchError::network(e)),
            Err(_) => Err(MirrorSwitchError::network(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("request to {url} timed out after {}s", timeout.as_secs()),
            ))),
        }
    }
}

fn header_string(response: &hyper::Response<hyper::body::Incoming>, name: &str) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl HttpFetch for HyperFetch {
    async fn get(
        &self,
        url: &str,
        if_none_match: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchResponse, MirrorSwitchError> {
        let response = self
            .request(hyper::Method::GET, url, if_none_match, timeout)
            .await?;

        let status = response.status().as_u16();
        let etag = header_string(&response, "etag");
        let last_modified = header_string(&response, "last-modified");

        let body = response
            .into_body()
            .collect()
            .await
            .map_err(MirrorSwitchError::network)?
            .to_bytes();

        Ok(FetchResponse {
            status,
            etag,
            last_modified,
            body: String::from_utf8_lossy(&body).into_owned(),
        })
    }

    async fn head(&self, url: &str, timeout: Duration) -> Result<u16, MirrorSwitchError> {
        let response = self
            .request(hyper::Method::HEAD, url, None, timeout)
            .await?;
        Ok(response.status().as_u16())
    }
}
