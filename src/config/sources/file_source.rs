//! Local-file configuration source.
//!
//! Reads a user-registered JSON document asynchronously via Tokio and
//! decodes it. Validation happens centrally in the loader, once, for
//! every origin.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::config::model::ToolsConfiguration;
use crate::config::ConfigSource;
use crate::error::MirrorSwitchError;

use super::parse_tools_config;

pub struct FileSource {
    id: String,
    name: String,
    path: PathBuf,
}

impl FileSource {
    #[must_use]
    pub fn new(id: String, name: String, path: PathBuf) -> Self {
        Self { id, name, path }
    }
}

#[async_trait]
impl ConfigSource for FileSource {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<ToolsConfiguration, MirrorSwitchError> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MirrorSwitchError::ConfigNotFound {
                    path: self.path.clone(),
                }
            } else {
                MirrorSwitchError::Io(e)
            }
        })?;

        parse_tools_config(&content, &self.path.display().to_string())
    }
}
