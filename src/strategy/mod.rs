//! Strategy execution: reading and writing a tool's mirror setting.
//!
//! [`StrategyExecutor`] is the single entry point. It dispatches
//! exhaustively on the [`StrategyConfiguration`] tag, so a new strategy
//! kind cannot be added without the compiler pointing at every match
//! that needs updating. Submodules implement the five concrete targets:
//! shell command, XML file, JSON tree, regex substitution, and
//! key-value lines.

pub mod command;
pub mod jsonpath;
pub mod keyvalue;
pub mod parser;
pub mod regexp;
pub mod xml;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::model::{SourceConfiguration, StrategyConfiguration, ToolConfiguration};
use crate::error::MirrorSwitchError;
use crate::runner::CommandRunner;
use crate::template;

pub struct StrategyExecutor {
    runner: Arc<dyn CommandRunner>,
}

impl StrategyExecutor {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    /// Point `tool` at `source` by mutating the strategy's target.
    ///
    /// `custom_root` is the tool's recorded custom install path, if any;
    /// file-backed strategies probe it before the configured path.
    pub async fn execute(
        &self,
        strategy: &StrategyConfiguration,
        source: &SourceConfiguration,
        tool: &ToolConfiguration,
        custom_root: Option<&Path>,
    ) -> Result<(), MirrorSwitchError> {
        let variables = template::extract_variables(source, &HashMap::new());

        match strategy {
            StrategyConfiguration::Command { set, .. } => {
                command::set_value(&*self.runner, set, source).await
            }
            StrategyConfiguration::Xml { set, .. } => {
                let path = resolve_target_path(&set.file_path, custom_root);
                xml::set_value(&path, set, &variables).await
            }
            StrategyConfiguration::Jsonpath { set, .. } => {
                let path = resolve_target_path(&set.file_path, custom_root);
                jsonpath::set_value(&path, set, &variables).await
            }
            StrategyConfiguration::Regex { set, .. } => {
                let path = resolve_target_path(&set.file_path, custom_root);
                regexp::set_value(&path, set, &variables).await
            }
            StrategyConfiguration::Keyvalue { set, .. } => {
                let path = resolve_target_path(&set.file_path, custom_root);
                keyvalue::set_value(&path, set, &variables).await
            }
        }
        .map_err(|e| match e {
            // Strategy failures surface as-is except raw IO, which gains
            // the switch context it would otherwise lack.
            MirrorSwitchError::Io(io) => MirrorSwitchError::SwitchFailed {
                reason: format!("{}: {io}", tool.id),
            },
            other => other,
        })
    }

    /// Read the current mirror value back from the strategy's target.
    pub async fn current_value(
        &self,
        strategy: &StrategyConfiguration,
        custom_root: Option<&Path>,
    ) -> Result<String, MirrorSwitchError> {
        match strategy {
            StrategyConfiguration::Command { get, .. } => {
                command::get_value(&*self.runner, get).await
            }
            StrategyConfiguration::Xml { get, .. } => {
                let path = resolve_target_path(&get.file_path, custom_root);
                xml::get_value(&path, get).await
            }
            StrategyConfiguration::Jsonpath { get, .. } => {
                let path = resolve_target_path(&get.file_path, custom_root);
                let value = jsonpath::get_value(&path, get).await?;
                Ok(stringify_json(&value))
            }
            StrategyConfiguration::Regex { get, .. } => {
                let path = resolve_target_path(&get.file_path, custom_root);
                regexp::get_value(&path, get).await
            }
            StrategyConfiguration::Keyvalue { get, .. } => {
                let path = resolve_target_path(&get.file_path, custom_root);
                keyvalue::get_value(&path, get).await
            }
        }
    }
}

fn stringify_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => String::new(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Resolve the configured target path: tilde-expand it, then, when a
/// custom install root has been recorded for the tool, probe the
/// root's `conf/` subfolder and the root itself for a file of the same
/// name before falling back to the literal path.
#[must_use]
pub fn resolve_target_path(configured: &str, custom_root: Option<&Path>) -> PathBuf {
    let expanded = PathBuf::from(shellexpand::tilde(configured).into_owned());

    if let Some(root) = custom_root {
        if let Some(file_name) = expanded.file_name() {
            for candidate in [root.join("conf").join(file_name), root.join(file_name)] {
                if candidate.exists() {
                    return candidate;
                }
            }
        }
    }

    expanded
}

/// Read the target file, mapping a missing file to `ConfigNotFound`.
pub(crate) async fn read_target(path: &Path) -> Result<String, MirrorSwitchError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            MirrorSwitchError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            MirrorSwitchError::Io(e)
        }
    })
}

/// Overwrite the target via temp-file-in-same-directory plus atomic
/// rename, so a crash mid-write never leaves a truncated file.
pub(crate) async fn write_atomic(path: &Path, content: String) -> Result<(), MirrorSwitchError> {
    let path = path.to_path_buf();
    let parent = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    tokio::task::spawn_blocking(move || -> Result<(), MirrorSwitchError> {
        use std::io::Write;

        let mut tmp = tempfile::NamedTempFile::new_in(&parent)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.persist(&path)
            .map_err(|e| MirrorSwitchError::Io(e.error))?;
        Ok(())
    })
    .await
    .map_err(|e| MirrorSwitchError::SwitchFailed {
        reason: format!("write task failed: {e}"),
    })?
}
