//! Application directory layout.
//!
//! Everything mirrorswitch persists lives under one per-user directory:
//! registered configuration sources, the remote-config cache, selection
//! state, backups, and the audit log. Commands construct the layout
//! once and pass it by reference, so tests can point the whole
//! application at a temp directory.

use std::path::{Path, PathBuf};

use crate::error::MirrorSwitchError;

#[derive(Debug, Clone)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    /// Per-user default: `<config dir>/mirrorswitch`.
    pub fn default_root() -> Result<Self, MirrorSwitchError> {
        let base = dirs::config_dir().ok_or_else(|| {
            MirrorSwitchError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "no user config directory",
            ))
        })?;
        Ok(Self::at(base.join("mirrorswitch")))
    }

    #[must_use]
    pub fn at(root: PathBuf) -> Self {
        Self { root }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Registered configuration sources (JSON list).
    #[must_use]
    pub fn source_registry(&self) -> PathBuf {
        self.root.join("config-sources.json")
    }

    /// Remote-config cache directory (`<name>.json` + `<name>.meta` pairs).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.root.join("cache")
    }

    /// Per-tool backup tree.
    #[must_use]
    pub fn backup_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    /// `toolId -> sourceId` selection map.
    #[must_use]
    pub fn selection_state(&self) -> PathBuf {
        self.root.join("selections.json")
    }

    /// `toolId -> custom install path` map.
    #[must_use]
    pub fn custom_paths(&self) -> PathBuf {
        self.root.join("custom-paths.json")
    }

    /// Append-only JSONL load audit log.
    #[must_use]
    pub fn audit_log(&self) -> PathBuf {
        self.root.join("audit.jsonl")
    }

    pub async fn ensure_layout(&self) -> Result<(), MirrorSwitchError> {
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::create_dir_all(self.cache_dir()).await?;
        tokio::fs::create_dir_all(self.backup_dir()).await?;
        Ok(())
    }
}
