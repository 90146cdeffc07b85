//! Registry of user-registered configuration sources.
//!
//! The builtin configuration is always first; users append local-file
//! or remote-URL sources, loaded in registration order. The
//! `MIRRORSWITCH_CONFIG_URL` environment variable, when present, is
//! auto-registered as one extra remote source with the highest
//! priority (it loads last, so its tool definitions win).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::MirrorSwitchError;

pub const CONFIG_URL_ENV: &str = "MIRRORSWITCH_CONFIG_URL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RegisteredKind {
    Local,
    Remote,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredSource {
    pub id: String,
    pub name: String,
    pub kind: RegisteredKind,
    /// File path for `local`, URL for `remote`.
    pub location: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone)]
pub struct SourceRegistry {
    path: PathBuf,
}

impl SourceRegistry {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Registered sources in registration order. A missing registry
    /// file means no registrations yet, not an error.
    pub async fn list(&self) -> Result<Vec<RegisteredSource>, MirrorSwitchError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => serde_json::from_str(&content).map_err(|e| {
                MirrorSwitchError::parse(format!(
                    "source registry {}: {e}",
                    self.path.display()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(MirrorSwitchError::Io(e)),
        }
    }

    /// Registered sources plus the env-var remote override, if set.
    pub async fn enabled_sources(&self) -> Result<Vec<RegisteredSource>, MirrorSwitchError> {
        let mut sources: Vec<RegisteredSource> = self
            .list()
            .await?
            .into_iter()
            .filter(|s| s.enabled)
            .collect();

        if let Ok(url) = std::env::var(CONFIG_URL_ENV) {
            if !url.is_empty() {
                sources.push(RegisteredSource {
                    id: "env-override".into(),
                    name: format!("{CONFIG_URL_ENV} override"),
                    kind: RegisteredKind::Remote,
                    location: url,
                    enabled: true,
                });
            }
        }

        Ok(sources)
    }

    pub async fn add(&self, source: RegisteredSource) -> Result<(), MirrorSwitchError> {
        let mut sources = self.list().await?;
        if sources.iter().any(|s| s.id == source.id) {
            return Err(MirrorSwitchError::SwitchFailed {
                reason: format!("configuration source '{}' already registered", source.id),
            });
        }
        sources.push(source);
        self.save(&sources).await
    }

    pub async fn remove(&self, id: &str) -> Result<(), MirrorSwitchError> {
        let mut sources = self.list().await?;
        let before = sources.len();
        sources.retain(|s| s.id != id);
        if sources.len() == before {
            return Err(MirrorSwitchError::SourceNotFound(id.to_string()));
        }
        self.save(&sources).await
    }

    async fn save(&self, sources: &[RegisteredSource]) -> Result<(), MirrorSwitchError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut content = serde_json::to_string_pretty(sources)
            .map_err(|e| MirrorSwitchError::parse(format!("source registry: {e}")))?;
        content.push('\n');
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}
