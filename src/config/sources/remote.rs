//! Remote-URL configuration source with ETag caching.
//!
//! A fresh cache entry (inside the expiry window) is served without
//! touching the network. A stale entry contributes its ETag as
//! `If-None-Match`; a 304 answer revalidates the cached body and
//! extends the window. Anything else must be a 200 whose body replaces
//! the cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::client::HttpFetch;
use crate::config::cache::{CacheMetadata, CacheStore, DEFAULT_CACHE_TTL};
use crate::config::model::ToolsConfiguration;
use crate::config::ConfigSource;
use crate::error::MirrorSwitchError;

use super::parse_tools_config;

/// Ceiling on the configuration GET; remote sources must never stall
/// a load indefinitely.
pub const REMOTE_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

pub struct RemoteSource {
    id: String,
    name: String,
    url: String,
    fetch: Arc<dyn HttpFetch>,
    cache: CacheStore,
    ttl: Duration,
}

impl RemoteSource {
    #[must_use]
    pub fn new(id: String, name: String, url: String, fetch: Arc<dyn HttpFetch>, cache: CacheStore) -> Self {
        Self {
            id,
            name,
            url,
            fetch,
            cache,
            ttl: DEFAULT_CACHE_TTL,
        }
    }

    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    fn metadata(&self, etag: Option<String>, last_modified: Option<String>, version: Option<String>) -> CacheMetadata {
        let now = Utc::now();
        CacheMetadata {
            etag,
            last_modified,
            cached_at: now,
            expiry: now
                + chrono::Duration::from_std(self.ttl)
                    .unwrap_or_else(|_| chrono::Duration::seconds(3600)),
            version,
        }
    }
}

#[async_trait]
impl ConfigSource for RemoteSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<ToolsConfiguration, MirrorSwitchError> {
        let cached = self.cache.read(&self.id).await;

        if let Some((body, meta)) = &cached {
            if meta.is_fresh(Utc::now()) {
                tracing::debug!(source = %self.id, "remote config served from fresh cache");
                return parse_tools_config(body, &self.url);
            }
        }

        let etag = cached.as_ref().and_then(|(_, meta)| meta.etag.clone());
        let response = self
            .fetch
            .get(&self.url, etag.as_deref(), REMOTE_FETCH_TIMEOUT)
            .await?;

        if response.status == 304 {
            let Some((body, meta)) = cached else {
                return Err(MirrorSwitchError::network(std::io::Error::other(format!(
                    "{}: 304 without a cached body",
                    self.url
                ))));
            };
            let config = parse_tools_config(&body, &self.url)?;
            let refreshed = self.metadata(meta.etag, meta.last_modified, Some(config.version.clone()));
            self.cache.touch(&self.id, &refreshed).await?;
            tracing::debug!(source = %self.id, "remote config revalidated (304)");
            return Ok(config);
        }

        if response.status != 200 {
            return Err(MirrorSwitchError::network(std::io::Error::other(format!(
                "{}: unexpected HTTP status {}",
                self.url, response.status
            ))));
        }

        let config = parse_tools_config(&response.body, &self.url)?;
        let meta = self.metadata(
            response.etag.clone(),
            response.last_modified.clone(),
            Some(config.version.clone()),
        );
        self.cache.write(&self.id, &response.body, &meta).await?;
        tracing::info!(source = %self.id, tools = config.tools.len(), "remote config fetched");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchResponse;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const BODY: &str = r#"{"version":"1.0.0","tools":[{"id":"t","name":"T","detection":{"command":"t"},"sources":[{"id":"s","name":"S","url":"https://m.example.com/"}],"strategy":{"type":"keyvalue","set":{"filePath":"~/.trc","key":"registry","value":"{{url}}"},"get":{"filePath":"~/.trc","key":"registry"}}}]}"#;

    struct FakeFetch {
        status: u16,
        etag: Option<&'static str>,
        body: &'static str,
        calls: AtomicUsize,
        seen_etag: std::sync::Mutex<Option<String>>,
    }

    impl FakeFetch {
        fn new(status: u16, etag: Option<&'static str>, body: &'static str) -> Self {
            Self {
                status,
                etag,
                body,
                calls: AtomicUsize::new(0),
                seen_etag: std::sync::Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl HttpFetch for FakeFetch {
        async fn get(
            &self,
            _url: &str,
            if_none_match: Option<&str>,
            _timeout: Duration,
        ) -> Result<FetchResponse, MirrorSwitchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.seen_etag.lock().unwrap() = if_none_match.map(str::to_string);
            Ok(FetchResponse {
                status: self.status,
                etag: self.etag.map(str::to_string),
                last_modified: None,
                body: self.body.to_string(),
            })
        }

        async fn head(&self, _url: &str, _timeout: Duration) -> Result<u16, MirrorSwitchError> {
            Ok(200)
        }
    }

    fn remote(fetch: Arc<FakeFetch>, dir: &std::path::Path) -> RemoteSource {
        RemoteSource::new(
            "team".into(),
            "Team".into(),
            "https://config.example.com/tools.json".into(),
            fetch,
            CacheStore::new(dir.to_path_buf()),
        )
    }

    #[tokio::test]
    async fn fetches_and_caches_on_200() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = Arc::new(FakeFetch::new(200, Some("\"v1\""), BODY));
        let source = remote(Arc::clone(&fetch), dir.path());

        let config = source.load().await.unwrap();
        assert_eq!(config.tools.len(), 1);
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 1);

        let (cached_body, meta) = source.cache.read("team").await.unwrap();
        assert_eq!(cached_body, BODY);
        assert_eq!(meta.etag.as_deref(), Some("\"v1\""));
    }

    #[tokio::test]
    async fn fresh_cache_skips_the_network() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = Arc::new(FakeFetch::new(200, Some("\"v1\""), BODY));
        let source = remote(Arc::clone(&fetch), dir.path());

        source.load().await.unwrap();
        source.load().await.unwrap();
        assert_eq!(fetch.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stale_cache_revalidates_with_etag_and_304_reuses_body() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = Arc::new(FakeFetch::new(304, None, ""));
        let source = remote(Arc::clone(&fetch), dir.path()).with_ttl(Duration::ZERO);

        // Seed an expired cache entry carrying an ETag.
        let now = Utc::now();
        source
            .cache
            .write(
                "team",
                BODY,
                &CacheMetadata {
                    etag: Some("\"v1\"".into()),
                    last_modified: None,
                    cached_at: now,
                    expiry: now - chrono::Duration::seconds(1),
                    version: Some("1.0.0".into()),
                },
            )
            .await
            .unwrap();

        let config = source.load().await.unwrap();
        assert_eq!(config.tools.len(), 1);
        assert_eq!(
            fetch.seen_etag.lock().unwrap().as_deref(),
            Some("\"v1\"")
        );
    }

    #[tokio::test]
    async fn unexpected_status_is_a_network_error() {
        let dir = tempfile::tempdir().unwrap();
        let fetch = Arc::new(FakeFetch::new(500, None, ""));
        let source = remote(fetch, dir.path());
        let err = source.load().await.unwrap_err();
        assert!(matches!(err, MirrorSwitchError::Network { .. }));
    }
}
