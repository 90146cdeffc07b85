//! Configuration loading, validation, merging, and caching.
//!
//! Defines the [`ConfigSource`] trait for pluggable configuration
//! origins and the [`ConfigLoader`] that walks the ordered source list
//! (builtin first, then registered local/remote sources), validates
//! each document, and merges them into one [`ToolsConfiguration`].
//! Submodules provide the data model, validation logic, concrete
//! sources, the remote cache, the source registry, and the audit log.

pub mod audit;
pub mod cache;
pub mod model;
pub mod registry;
pub mod sources;
pub mod validation;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::client::HttpFetch;
use crate::error::MirrorSwitchError;
use audit::{AuditLog, AuditRecord, LoadOutcome};
use cache::CacheStore;
use model::ToolsConfiguration;
use registry::{RegisteredKind, SourceRegistry};
use sources::builtin::BuiltinSource;
use sources::file_source::FileSource;
use sources::remote::RemoteSource;
use sources::sha256_hex;

// async_trait is required here because ConfigSource is used as
// Box<dyn ConfigSource> and native async fn in traits does not support
// dyn dispatch.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn is_builtin(&self) -> bool {
        false
    }
    async fn load(&self) -> Result<ToolsConfiguration, MirrorSwitchError>;
}

pub struct ConfigLoader {
    sources: Vec<Box<dyn ConfigSource>>,
    audit: AuditLog,
}

impl ConfigLoader {
    /// A loader over the builtin source only.
    #[must_use]
    pub fn new(audit: AuditLog) -> Self {
        Self {
            sources: vec![Box::new(BuiltinSource)],
            audit,
        }
    }

    /// Append a source; later sources win tool-id conflicts.
    pub fn push(&mut self, source: Box<dyn ConfigSource>) {
        self.sources.push(source);
    }

    /// Build the full ordered source list from the persisted registry:
    /// builtin, then each enabled registration, then the env override.
    pub async fn from_registry(
        registry: &SourceRegistry,
        cache_dir: PathBuf,
        fetch: Arc<dyn HttpFetch>,
        audit: AuditLog,
    ) -> Result<Self, MirrorSwitchError> {
        let mut loader = Self::new(audit);

        for registered in registry.enabled_sources().await? {
            match registered.kind {
                RegisteredKind::Local => {
                    let path = PathBuf::from(shellexpand::tilde(&registered.location).into_owned());
                    loader.push(Box::new(FileSource::new(
                        registered.id,
                        registered.name,
                        path,
                    )));
                }
                RegisteredKind::Remote => {
                    loader.push(Box::new(RemoteSource::new(
                        registered.id,
                        registered.name,
                        registered.location,
                        Arc::clone(&fetch),
                        CacheStore::new(cache_dir.clone()),
                    )));
                }
            }
        }

        Ok(loader)
    }

    /// Load and merge every source. Individual failures are audit-logged
    /// and skipped; the caller is never left without a configuration;
    /// the builtin constant is the terminal fallback.
    pub async fn load(&self) -> ToolsConfiguration {
        let mut merged: Option<ToolsConfiguration> = None;

        for source in &self.sources {
            match self.load_one(source.as_ref()).await {
                Ok(config) => {
                    let tools = config.tools.len();
                    let digest = serde_json::to_vec(&config)
                        .ok()
                        .map(|bytes| sha256_hex(&bytes));
                    self.audit
                        .record(&AuditRecord {
                            timestamp: Utc::now(),
                            source_id: source.id().to_string(),
                            source_name: source.name().to_string(),
                            builtin: source.is_builtin(),
                            outcome: LoadOutcome::Success,
                            message: None,
                            tools: Some(tools),
                            digest,
                        })
                        .await;

                    match merged {
                        Some(ref mut base) => merge_tools(base, config),
                        None => merged = Some(config),
                    }
                }
                Err(e) => {
                    tracing::warn!(source = source.id(), error = %e, "config source failed, skipping");
                    self.audit
                        .record(&AuditRecord {
                            timestamp: Utc::now(),
                            source_id: source.id().to_string(),
                            source_name: source.name().to_string(),
                            builtin: source.is_builtin(),
                            outcome: LoadOutcome::Failure,
                            message: Some(e.to_string()),
                            tools: None,
                            digest: None,
                        })
                        .await;
                }
            }
        }

        merged.unwrap_or_else(|| {
            tracing::error!("every configuration source failed; using builtin");
            let mut fallback = sources::builtin::configuration();
            stamp_provenance(&mut fallback, &BuiltinSource);
            fallback
        })
    }

    async fn load_one(
        &self,
        source: &dyn ConfigSource,
    ) -> Result<ToolsConfiguration, MirrorSwitchError> {
        let mut config = source.load().await?;

        validation::check_version(&config.version)?;
        if let Err(errors) = validation::validate(&config) {
            return Err(MirrorSwitchError::ValidationFailed { errors });
        }

        stamp_provenance(&mut config, source);
        Ok(config)
    }
}

/// Record which configuration source each mirror definition came from.
fn stamp_provenance(config: &mut ToolsConfiguration, source: &dyn ConfigSource) {
    for tool in &mut config.tools {
        for mirror in &mut tool.sources {
            mirror.config_source_id = Some(source.id().to_string());
            mirror.config_source_name = Some(source.name().to_string());
            mirror.config_source_is_builtin = Some(source.is_builtin());
        }
    }
}

/// Merge `incoming` into `base`: a tool with an already-known id
/// replaces the existing definition wholesale (no field-level merge),
/// unknown tools are appended.
pub fn merge_tools(base: &mut ToolsConfiguration, incoming: ToolsConfiguration) {
    for tool in incoming.tools {
        match base.tools.iter_mut().find(|t| t.id == tool.id) {
            Some(existing) => *existing = tool,
            None => base.tools.push(tool),
        }
    }
}
