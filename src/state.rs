//! Persisted per-tool state: active source selections and custom
//! install paths.
//!
//! Both stores are flat `toolId -> value` JSON maps. Selections record
//! which mirror the user last switched to (written only after a switch
//! actually succeeded); custom paths point tools at non-standard
//! install roots so strategy files can be resolved relative to them.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::MirrorSwitchError;

async fn read_map(path: &PathBuf) -> Result<BTreeMap<String, String>, MirrorSwitchError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => serde_json::from_str(&content)
            .map_err(|e| MirrorSwitchError::parse(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
        Err(e) => Err(MirrorSwitchError::Io(e)),
    }
}

async fn write_map(
    path: &PathBuf,
    map: &BTreeMap<String, String>,
) -> Result<(), MirrorSwitchError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut content = serde_json::to_string_pretty(map)
        .map_err(|e| MirrorSwitchError::parse(format!("{}: {e}", path.display())))?;
    content.push('\n');
    tokio::fs::write(path, content).await?;
    Ok(())
}

/// `toolId -> sourceId` map of the last successful switch per tool.
///
/// Switches of different tools may run concurrently, so every
/// read-modify-write cycle holds a lock shared by all clones of the
/// store. Without it two concurrent `set` calls can each read the
/// pre-update map and the second write drops the first entry.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl SelectionStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get(&self, tool_id: &str) -> Result<Option<String>, MirrorSwitchError> {
        Ok(read_map(&self.path).await?.remove(tool_id))
    }

    pub async fn all(&self) -> Result<BTreeMap<String, String>, MirrorSwitchError> {
        read_map(&self.path).await
    }

    pub async fn set(&self, tool_id: &str, source_id: &str) -> Result<(), MirrorSwitchError> {
        let _guard = self.lock.lock().await;
        let mut map = read_map(&self.path).await?;
        map.insert(tool_id.to_string(), source_id.to_string());
        write_map(&self.path, &map).await
    }

    /// Forget the selection for a tool, e.g. when detection finds the
    /// live value no longer matches any known source.
    pub async fn clear(&self, tool_id: &str) -> Result<(), MirrorSwitchError> {
        let _guard = self.lock.lock().await;
        let mut map = read_map(&self.path).await?;
        if map.remove(tool_id).is_some() {
            write_map(&self.path, &map).await?;
        }
        Ok(())
    }
}

/// `toolId -> install root` map for tools living outside the default
/// location. Strategy target files are probed under this root first.
/// Updates hold the same kind of shared lock as [`SelectionStore`].
#[derive(Debug, Clone)]
pub struct CustomPathStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl CustomPathStore {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn get(&self, tool_id: &str) -> Result<Option<PathBuf>, MirrorSwitchError> {
        Ok(read_map(&self.path)
            .await?
            .remove(tool_id)
            .map(|raw| PathBuf::from(shellexpand::tilde(&raw).into_owned())))
    }

    pub async fn set(&self, tool_id: &str, root: &str) -> Result<(), MirrorSwitchError> {
        let _guard = self.lock.lock().await;
        let mut map = read_map(&self.path).await?;
        map.insert(tool_id.to_string(), root.to_string());
        write_map(&self.path, &map).await
    }

    pub async fn clear(&self, tool_id: &str) -> Result<(), MirrorSwitchError> {
        let _guard = self.lock.lock().await;
        let mut map = read_map(&self.path).await?;
        if map.remove(tool_id).is_some() {
            write_map(&self.path, &map).await?;
        }
        Ok(())
    }
}
