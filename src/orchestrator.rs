//! The coordination layer every command talks to.
//!
//! Owns the merged configuration behind a read-write lock and wires
//! together the strategy executor, backup manager, detector, speed
//! tester, and the persisted per-tool state. Switches for the same
//! tool are serialized through a per-tool async mutex so two
//! concurrent invocations cannot interleave a backup with a write.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{broadcast, Mutex, RwLock};

use crate::backup::BackupManager;
use crate::client::HttpFetch;
use crate::config::model::{SourceConfiguration, ToolConfiguration, ToolsConfiguration};
use crate::config::ConfigLoader;
use crate::detect::{self, Detector, Installation};
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;
use crate::runner::{CommandRunner, RunOptions};
use crate::speed::{SpeedResult, SpeedTester};
use crate::state::{CustomPathStore, SelectionStore};
use crate::strategy::StrategyExecutor;
use crate::template;

#[derive(Debug, Clone)]
pub enum Event {
    ConfigReloaded { tools: usize },
    SelectionChanged { tool_id: String, source_id: String },
}

/// What a completed switch did, keyed by its correlation id so log
/// lines and the report can be tied together.
#[derive(Debug, Clone)]
pub struct SwitchReport {
    pub correlation_id: String,
    pub tool_id: String,
    pub source_id: String,
    pub source_name: String,
    pub url: String,
    pub backup_path: Option<PathBuf>,
}

/// Where a tool currently points.
#[derive(Debug, Clone)]
pub struct CurrentStatus {
    pub value: String,
    /// The configured source the live value was matched to, if any.
    pub matched: Option<SourceConfiguration>,
}

pub struct Orchestrator {
    config: RwLock<ToolsConfiguration>,
    loader: ConfigLoader,
    executor: StrategyExecutor,
    detector: Detector,
    tester: SpeedTester,
    backups: BackupManager,
    selections: SelectionStore,
    custom_paths: CustomPathStore,
    runner: Arc<dyn CommandRunner>,
    switch_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    events: broadcast::Sender<Event>,
}

impl Orchestrator {
    pub async fn new(
        loader: ConfigLoader,
        paths: &AppPaths,
        fetch: Arc<dyn HttpFetch>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        let config = loader.load().await;
        let (events, _) = broadcast::channel(16);

        Self {
            config: RwLock::new(config),
            loader,
            executor: StrategyExecutor::new(Arc::clone(&runner)),
            detector: Detector::new(Arc::clone(&runner)),
            tester: SpeedTester::new(fetch, Arc::clone(&runner)),
            backups: BackupManager::new(paths.backup_dir()),
            selections: SelectionStore::new(paths.selection_state()),
            custom_paths: CustomPathStore::new(paths.custom_paths()),
            runner,
            switch_locks: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub async fn config(&self) -> ToolsConfiguration {
        self.config.read().await.clone()
    }

    pub async fn tool(&self, tool_id: &str) -> Result<ToolConfiguration, MirrorSwitchError> {
        self.config
            .read()
            .await
            .tool(tool_id)
            .cloned()
            .ok_or_else(|| MirrorSwitchError::ToolNotFound(tool_id.to_string()))
    }

    pub async fn selection(&self, tool_id: &str) -> Result<Option<String>, MirrorSwitchError> {
        self.selections.get(tool_id).await
    }

    pub async fn set_custom_path(
        &self,
        tool_id: &str,
        root: &str,
    ) -> Result<(), MirrorSwitchError> {
        self.tool(tool_id).await?;
        self.custom_paths.set(tool_id, root).await
    }

    pub async fn clear_custom_path(&self, tool_id: &str) -> Result<(), MirrorSwitchError> {
        self.custom_paths.clear(tool_id).await
    }

    async fn lock_for(&self, tool_id: &str) -> Arc<Mutex<()>> {
        let mut locks = self.switch_locks.lock().await;
        Arc::clone(
            locks
                .entry(tool_id.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Point a tool at one of its configured sources.
    ///
    /// The target file is backed up first when the tool supports it, the
    /// strategy runs, post actions follow, and only then is the
    /// selection persisted. A failed strategy leaves the previous
    /// selection untouched.
    pub async fn switch_source(
        &self,
        tool_id: &str,
        source_id: &str,
    ) -> Result<SwitchReport, MirrorSwitchError> {
        let lock = self.lock_for(tool_id).await;
        let _guard = lock.lock().await;

        let tool = self.tool(tool_id).await?;
        let source = tool
            .source(source_id)
            .cloned()
            .ok_or_else(|| MirrorSwitchError::SourceNotFound(source_id.to_string()))?;

        let correlation_id = uuid::Uuid::new_v4().to_string();
        let custom_root = self.custom_paths.get(tool_id).await?;

        tracing::info!(
            correlation_id = %correlation_id,
            tool = %tool_id,
            source = %source_id,
            url = %source.url,
            "switching source"
        );

        let backup_path = match self.backups.backup(&tool, custom_root.as_deref()).await {
            Ok(outcome) => Some(outcome.backup_path),
            Err(MirrorSwitchError::BackupNotSupported(_)) => None,
            // First switch may predate the target file; the strategy
            // will create it.
            Err(MirrorSwitchError::ConfigNotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        self.executor
            .execute(&tool.strategy, &source, &tool, custom_root.as_deref())
            .await?;

        self.run_post_actions(&tool, &source, &correlation_id).await;

        self.selections.set(tool_id, source_id).await?;
        let _ = self.events.send(Event::SelectionChanged {
            tool_id: tool_id.to_string(),
            source_id: source_id.to_string(),
        });

        tracing::info!(correlation_id = %correlation_id, tool = %tool_id, "switch complete");

        Ok(SwitchReport {
            correlation_id,
            tool_id: tool_id.to_string(),
            source_id: source_id.to_string(),
            source_name: source.name,
            url: source.url,
            backup_path,
        })
    }

    /// Post actions are best-effort: the switch itself already
    /// succeeded, so failures are logged rather than returned.
    async fn run_post_actions(
        &self,
        tool: &ToolConfiguration,
        source: &SourceConfiguration,
        correlation_id: &str,
    ) {
        if tool.post_actions.is_empty() {
            return;
        }
        let variables = template::extract_variables(source, &HashMap::new());

        for action in &tool.post_actions {
            let arguments = match template::resolve_all(&action.arguments, &variables) {
                Ok(arguments) => arguments,
                Err(e) => {
                    tracing::warn!(
                        correlation_id,
                        command = %action.command,
                        error = %e,
                        "post action skipped"
                    );
                    continue;
                }
            };

            match self
                .runner
                .run(&action.command, &arguments, &RunOptions::default())
                .await
            {
                Ok(output) if output.success() => {
                    tracing::debug!(correlation_id, command = %action.command, "post action ran");
                }
                Ok(output) => {
                    tracing::warn!(
                        correlation_id,
                        command = %action.command,
                        exit_code = output.exit_code,
                        stderr = %output.stderr.trim(),
                        "post action failed"
                    );
                }
                Err(e) => {
                    tracing::warn!(correlation_id, command = %action.command, error = %e, "post action failed");
                }
            }
        }
    }

    /// Read the live value from the tool's strategy target and match it
    /// against the configured sources. The persisted selection is
    /// synchronized to what was actually found: updated on a match,
    /// cleared when the tool points somewhere unknown.
    pub async fn detect_current_source(
        &self,
        tool_id: &str,
    ) -> Result<CurrentStatus, MirrorSwitchError> {
        let tool = self.tool(tool_id).await?;
        let custom_root = self.custom_paths.get(tool_id).await?;

        let value = self
            .executor
            .current_value(&tool.strategy, custom_root.as_deref())
            .await?;

        let matched = detect::match_source(&value, &tool.sources).cloned();
        match &matched {
            Some(source) => self.selections.set(tool_id, &source.id).await?,
            None => self.selections.clear(tool_id).await?,
        }

        Ok(CurrentStatus { value, matched })
    }

    pub async fn detect_installation(
        &self,
        tool_id: &str,
    ) -> Result<Installation, MirrorSwitchError> {
        let tool = self.tool(tool_id).await?;
        Ok(self.detector.detect(&tool.detection).await)
    }

    pub async fn backup(&self, tool_id: &str) -> Result<PathBuf, MirrorSwitchError> {
        let lock = self.lock_for(tool_id).await;
        let _guard = lock.lock().await;

        let tool = self.tool(tool_id).await?;
        let custom_root = self.custom_paths.get(tool_id).await?;
        let outcome = self.backups.backup(&tool, custom_root.as_deref()).await?;
        Ok(outcome.backup_path)
    }

    pub async fn restore(&self, tool_id: &str) -> Result<PathBuf, MirrorSwitchError> {
        let lock = self.lock_for(tool_id).await;
        let _guard = lock.lock().await;

        let tool = self.tool(tool_id).await?;
        let custom_root = self.custom_paths.get(tool_id).await?;
        let restored = self.backups.restore(&tool, custom_root.as_deref()).await?;

        // The restored file may point anywhere; the old selection is no
        // longer trustworthy.
        self.selections.clear(tool_id).await?;
        Ok(restored)
    }

    pub async fn test_speed(&self, tool_id: &str) -> Result<Vec<SpeedResult>, MirrorSwitchError> {
        let tool = self.tool(tool_id).await?;
        Ok(self.tester.test_all(&tool.sources).await)
    }

    /// Re-run the full loader pipeline and swap the merged result in
    /// wholesale.
    pub async fn reload(&self) -> ToolsConfiguration {
        let fresh = self.loader.load().await;
        let tools = fresh.tools.len();
        *self.config.write().await = fresh.clone();
        let _ = self.events.send(Event::ConfigReloaded { tools });
        tracing::info!(tools, "configuration reloaded");
        fresh
    }
}
