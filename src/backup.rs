//! Backing up and restoring strategy target files.
//!
//! Backups live under a per-tool subdirectory of the application backup
//! root. The first time a tool is ever backed up, the pristine file is
//! also copied to an `.original` sibling (when the tool's backup
//! configuration asks for it) so the pre-mirrorswitch state stays
//! recoverable forever. Restore walks a fixed candidate list so older
//! layouts keep working.

use std::path::{Path, PathBuf};

use crate::config::model::{StrategyConfiguration, ToolConfiguration};
use crate::error::MirrorSwitchError;
use crate::strategy::resolve_target_path;

const DEFAULT_ORIGINAL_SUFFIX: &str = ".original";

#[derive(Debug, Clone)]
pub struct BackupManager {
    root: PathBuf,
}

/// What a backup run produced.
#[derive(Debug, Clone)]
pub struct BackupOutcome {
    pub backup_path: PathBuf,
    /// Set when this run also captured the first-ever `.original` copy.
    pub original_path: Option<PathBuf>,
}

impl BackupManager {
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn tool_dir(&self, tool_id: &str) -> PathBuf {
        self.root.join(tool_id)
    }

    /// The file a backup would copy, or the reason the tool cannot be
    /// backed up. Command strategies have no file to copy.
    fn target_file(
        tool: &ToolConfiguration,
        custom_root: Option<&Path>,
    ) -> Result<PathBuf, MirrorSwitchError> {
        let configured = tool
            .backup
            .as_ref()
            .map(|b| b.file_path.as_str())
            .or_else(|| tool.strategy.target_file());

        match configured {
            Some(path) => Ok(resolve_target_path(path, custom_root)),
            None => Err(MirrorSwitchError::BackupNotSupported(tool.id.clone())),
        }
    }

    fn backup_file_name(tool: &ToolConfiguration, target: &Path) -> String {
        if let Some(backup) = &tool.backup {
            return backup.backup_file_name.clone();
        }
        match target.file_name() {
            Some(name) => format!("{}.backup", name.to_string_lossy()),
            None => format!("{}.backup", tool.id),
        }
    }

    /// Copy the tool's target file into the backup tree. Overwrites the
    /// previous backup; the `.original` copy is written at most once.
    pub async fn backup(
        &self,
        tool: &ToolConfiguration,
        custom_root: Option<&Path>,
    ) -> Result<BackupOutcome, MirrorSwitchError> {
        let target = Self::target_file(tool, custom_root)?;
        if !tokio::fs::try_exists(&target).await? {
            return Err(MirrorSwitchError::ConfigNotFound { path: target });
        }

        let dir = self.tool_dir(&tool.id);
        tokio::fs::create_dir_all(&dir).await?;

        let backup_path = dir.join(Self::backup_file_name(tool, &target));
        tokio::fs::copy(&target, &backup_path).await?;

        let mut original_path = None;
        let wants_original = tool.backup.as_ref().is_some_and(|b| b.backup_original);
        if wants_original {
            let suffix = tool
                .backup
                .as_ref()
                .and_then(|b| b.original_backup_suffix.as_deref())
                .unwrap_or(DEFAULT_ORIGINAL_SUFFIX);
            let original = dir.join(format!(
                "{}{suffix}",
                target
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| tool.id.clone())
            ));
            if !tokio::fs::try_exists(&original).await? {
                tokio::fs::copy(&target, &original).await?;
                original_path = Some(original);
            }
        }

        tracing::info!(tool = %tool.id, path = %backup_path.display(), "backup written");
        Ok(BackupOutcome {
            backup_path,
            original_path,
        })
    }

    /// Restore the most plausible backup over the live target file.
    /// Candidates, in order: the configured backup file name, then
    /// `<target file name>.backup`, then `<tool id>.backup`.
    pub async fn restore(
        &self,
        tool: &ToolConfiguration,
        custom_root: Option<&Path>,
    ) -> Result<PathBuf, MirrorSwitchError> {
        if matches!(tool.strategy, StrategyConfiguration::Command { .. })
            && tool.backup.is_none()
        {
            return Err(MirrorSwitchError::BackupNotSupported(tool.id.clone()));
        }

        let target = Self::target_file(tool, custom_root)?;
        let dir = self.tool_dir(&tool.id);

        let mut candidates = Vec::new();
        if let Some(backup) = &tool.backup {
            candidates.push(dir.join(&backup.backup_file_name));
        }
        if let Some(name) = target.file_name() {
            candidates.push(dir.join(format!("{}.backup", name.to_string_lossy())));
        }
        candidates.push(dir.join(format!("{}.backup", tool.id)));

        for candidate in candidates {
            if tokio::fs::try_exists(&candidate).await? {
                if let Some(parent) = target.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::copy(&candidate, &target).await?;
                tracing::info!(tool = %tool.id, from = %candidate.display(), "backup restored");
                return Ok(candidate);
            }
        }

        Err(MirrorSwitchError::BackupNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{
        BackupConfiguration, CommandGet, CommandSet, DetectionConfiguration, KeyValueGet,
        KeyValueSet, OutputParser,
    };
    use std::collections::HashMap;

    fn keyvalue_tool(file_path: &str, backup: Option<BackupConfiguration>) -> ToolConfiguration {
        ToolConfiguration {
            id: "npm".into(),
            name: "npm".into(),
            description: None,
            detection: DetectionConfiguration {
                command: "npm".into(),
                arguments: vec![],
                custom_paths: vec![],
                fallback_detection: None,
            },
            sources: vec![],
            strategy: StrategyConfiguration::Keyvalue {
                set: KeyValueSet {
                    file_path: file_path.into(),
                    key: "registry".into(),
                    value: "{{url}}".into(),
                    comment: None,
                    separator: "=".into(),
                },
                get: KeyValueGet {
                    file_path: file_path.into(),
                    key: "registry".into(),
                    separator: "=".into(),
                },
            },
            backup,
            metadata: None,
            post_actions: vec![],
        }
    }

    fn command_tool() -> ToolConfiguration {
        let mut tool = keyvalue_tool("~/.unused", None);
        tool.id = "yarn".into();
        tool.strategy = StrategyConfiguration::Command {
            set: CommandSet {
                command: "yarn".into(),
                arguments: vec![],
                environment: HashMap::new(),
                requires_admin: false,
                working_directory: None,
                pre_commands: vec![],
                timeout: None,
            },
            get: CommandGet {
                command: "yarn".into(),
                arguments: vec![],
                output_parser: OutputParser::Trim,
                parser_pattern: None,
                timeout: None,
            },
        };
        tool
    }

    #[tokio::test]
    async fn backup_then_restore_round_trips_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".npmrc");
        std::fs::write(&target, "registry=https://registry.npmjs.org/\n").unwrap();

        let manager = BackupManager::new(dir.path().join("backups"));
        let tool = keyvalue_tool(&target.to_string_lossy(), None);

        manager.backup(&tool, None).await.unwrap();
        std::fs::write(&target, "registry=https://registry.npmmirror.com/\n").unwrap();

        manager.restore(&tool, None).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "registry=https://registry.npmjs.org/\n"
        );
    }

    #[tokio::test]
    async fn original_copy_is_written_once() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".npmrc");
        std::fs::write(&target, "first\n").unwrap();

        let manager = BackupManager::new(dir.path().join("backups"));
        let tool = keyvalue_tool(
            &target.to_string_lossy(),
            Some(BackupConfiguration {
                file_path: target.to_string_lossy().into_owned(),
                backup_file_name: "npmrc.backup".into(),
                backup_original: true,
                original_backup_suffix: None,
            }),
        );

        let first = manager.backup(&tool, None).await.unwrap();
        let original = first.original_path.clone().unwrap();
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "first\n");

        std::fs::write(&target, "second\n").unwrap();
        let second = manager.backup(&tool, None).await.unwrap();
        assert!(second.original_path.is_none());
        // The original still holds the pristine content.
        assert_eq!(std::fs::read_to_string(&original).unwrap(), "first\n");
        // The rolling backup moved forward.
        assert_eq!(
            std::fs::read_to_string(&second.backup_path).unwrap(),
            "second\n"
        );
    }

    #[tokio::test]
    async fn restore_falls_back_to_tool_id_candidate() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".npmrc");
        std::fs::write(&target, "current\n").unwrap();

        let backups = dir.path().join("backups");
        std::fs::create_dir_all(backups.join("npm")).unwrap();
        std::fs::write(backups.join("npm/npm.backup"), "older layout\n").unwrap();

        let manager = BackupManager::new(backups);
        let tool = keyvalue_tool(&target.to_string_lossy(), None);

        let used = manager.restore(&tool, None).await.unwrap();
        assert!(used.ends_with("npm.backup"));
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "older layout\n");
    }

    #[tokio::test]
    async fn restore_without_any_backup_fails() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join(".npmrc");
        std::fs::write(&target, "x").unwrap();

        let manager = BackupManager::new(dir.path().join("backups"));
        let tool = keyvalue_tool(&target.to_string_lossy(), None);
        assert!(matches!(
            manager.restore(&tool, None).await.unwrap_err(),
            MirrorSwitchError::BackupNotFound
        ));
    }

    #[tokio::test]
    async fn command_strategy_is_not_backed_up() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"));
        let tool = command_tool();
        assert!(matches!(
            manager.backup(&tool, None).await.unwrap_err(),
            MirrorSwitchError::BackupNotSupported(_)
        ));
        assert!(matches!(
            manager.restore(&tool, None).await.unwrap_err(),
            MirrorSwitchError::BackupNotSupported(_)
        ));
    }

    #[tokio::test]
    async fn backing_up_a_missing_target_is_config_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let manager = BackupManager::new(dir.path().join("backups"));
        let tool = keyvalue_tool(&dir.path().join("absent").to_string_lossy(), None);
        assert!(matches!(
            manager.backup(&tool, None).await.unwrap_err(),
            MirrorSwitchError::ConfigNotFound { .. }
        ));
    }
}
