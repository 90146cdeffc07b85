//! On-disk cache for remote configuration bodies.
//!
//! Each cached remote source is a `<name>.json` body plus a
//! `<name>.meta` metadata record. A cache hit inside the expiry window
//! (default one hour) lets the loader skip the network entirely; a
//! stale entry still contributes its ETag for a conditional GET.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MirrorSwitchError;

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,

    pub cached_at: DateTime<Utc>,

    pub expiry: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl CacheMetadata {
    #[must_use]
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }
}

#[derive(Debug, Clone)]
pub struct CacheStore {
    dir: PathBuf,
}

impl CacheStore {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn body_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.json"))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}.meta"))
    }

    /// Both halves present and parseable, or nothing.
    pub async fn read(&self, name: &str) -> Option<(String, CacheMetadata)> {
        let body = tokio::fs::read_to_string(self.body_path(name)).await.ok()?;
        let meta_raw = tokio::fs::read_to_string(self.meta_path(name)).await.ok()?;
        let meta: CacheMetadata = serde_json::from_str(&meta_raw).ok()?;
        Some((body, meta))
    }

    pub async fn write(
        &self,
        name: &str,
        body: &str,
        meta: &CacheMetadata,
    ) -> Result<(), MirrorSwitchError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.body_path(name), body).await?;
        let meta_raw = serde_json::to_string_pretty(meta)
            .map_err(|e| MirrorSwitchError::parse(format!("cache metadata: {e}")))?;
        tokio::fs::write(self.meta_path(name), meta_raw).await?;
        Ok(())
    }

    /// Refresh only the metadata record (e.g. after a 304 extends the
    /// expiry window).
    pub async fn touch(&self, name: &str, meta: &CacheMetadata) -> Result<(), MirrorSwitchError> {
        let meta_raw = serde_json::to_string_pretty(meta)
            .map_err(|e| MirrorSwitchError::parse(format!("cache metadata: {e}")))?;
        tokio::fs::write(self.meta_path(name), meta_raw).await?;
        Ok(())
    }
}
