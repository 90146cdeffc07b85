//! Integration tests for the configuration pipeline: registry, file
//! and remote sources, merging, provenance, and the audit trail.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use mirrorswitch::client::{FetchResponse, HttpFetch};
use mirrorswitch::config::audit::{AuditLog, LoadOutcome};
use mirrorswitch::config::cache::{CacheMetadata, CacheStore};
use mirrorswitch::config::registry::{RegisteredKind, RegisteredSource, SourceRegistry};
use mirrorswitch::config::ConfigLoader;
use mirrorswitch::error::MirrorSwitchError;
use mirrorswitch::paths::AppPaths;

struct StaticFetch {
    status: u16,
    body: &'static str,
    etag: Option<&'static str>,
}

#[async_trait]
impl HttpFetch for StaticFetch {
    async fn get(
        &self,
        _url: &str,
        _if_none_match: Option<&str>,
        _timeout: Duration,
    ) -> Result<FetchResponse, MirrorSwitchError> {
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

fn tools_doc(tool_id: &str, url: &str) -> String {
    serde_json::json!({
        "version": "1.0.0",
        "tools": [{
            "id": tool_id,
            "name": tool_id,
            "detection": { "command": tool_id, "arguments": ["--version"] },
            "sources": [
                { "id": "primary", "name": "Primary", "url": url }
            ],
            "strategy": {
                "type": "keyvalue",
                "set": { "filePath": "~/.rc", "key": "registry", "value": "{{url}}" },
                "get": { "filePath": "~/.rc", "key": "registry" }
            }
        }]
    })
    .to_string()
}

async fn loader_for(
    paths: &AppPaths,
    fetch: Arc<dyn HttpFetch>,
) -> Result<ConfigLoader, MirrorSwitchError> {
    let registry = SourceRegistry::new(paths.source_registry());
    ConfigLoader::from_registry(
        &registry,
        paths.cache_dir(),
        fetch,
        AuditLog::new(paths.audit_log()),
    )
    .await
}

async fn register_local(paths: &AppPaths, id: &str, file: &Path) {
    let registry = SourceRegistry::new(paths.source_registry());
    registry
        .add(RegisteredSource {
            id: id.into(),
            name: id.into(),
            kind: RegisteredKind::Local,
            location: file.to_string_lossy().into_owned(),
            enabled: true,
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn registered_file_overrides_builtin_tool_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::at(dir.path().to_path_buf());
    paths.ensure_layout().await.unwrap();

    let file = dir.path().join("team.json");
    std::fs::write(&file, tools_doc("npm", "https://npm.corp.example.com/")).unwrap();
    register_local(&paths, "team", &file).await;

    let loader = loader_for(&paths, Arc::new(StaticFetch {
        status: 200,
        body: "",
        etag: None,
    }))
    .await
    .unwrap();
    let merged = loader.load().await;

    // npm came back with the team definition only.
    let npm = merged.tool("npm").unwrap();
    assert_eq!(npm.sources.len(), 1);
    assert_eq!(npm.sources[0].url, "https://npm.corp.example.com/");

    // Tools the team file does not mention keep their builtin shape.
    assert!(merged.tool("docker").is_some());
    assert!(merged.tool("maven").is_some());
}

#[tokio::test]
async fn provenance_identifies_where_each_source_came_from() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::at(dir.path().to_path_buf());
    paths.ensure_layout().await.unwrap();

    let file = dir.path().join("team.json");
    std::fs::write(&file, tools_doc("npm", "https://npm.corp.example.com/")).unwrap();
    register_local(&paths, "team", &file).await;

    let loader = loader_for(&paths, Arc::new(StaticFetch {
        status: 200,
        body: "",
        etag: None,
    }))
    .await
    .unwrap();
    let merged = loader.load().await;

    let npm = merged.tool("npm").unwrap();
    assert_eq!(npm.sources[0].config_source_id.as_deref(), Some("team"));
    assert_eq!(npm.sources[0].config_source_is_builtin, Some(false));

    let docker = merged.tool("docker").unwrap();
    assert_eq!(
        docker.sources[0].config_source_id.as_deref(),
        Some("builtin")
    );
    assert_eq!(docker.sources[0].config_source_is_builtin, Some(true));
}

#[tokio::test]
async fn broken_registered_file_is_skipped_and_audited() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::at(dir.path().to_path_buf());
    paths.ensure_layout().await.unwrap();

    let file = dir.path().join("broken.json");
    std::fs::write(&file, "{ not json").unwrap();
    register_local(&paths, "broken", &file).await;

    let loader = loader_for(&paths, Arc::new(StaticFetch {
        status: 200,
        body: "",
        etag: None,
    }))
    .await
    .unwrap();
    let merged = loader.load().await;

    // The builtin configuration still came through.
    assert!(!merged.tools.is_empty());

    let audit = AuditLog::new(paths.audit_log());
    let records = audit.tail(10).await;
    let failure = records
        .iter()
        .find(|r| r.source_id == "broken")
        .expect("broken source audited");
    assert_eq!(failure.outcome, LoadOutcome::Failure);
    assert!(failure.message.is_some());
}

#[tokio::test]
async fn stale_remote_cache_is_revalidated_via_304() {
    let dir = tempfile::tempdir().unwrap();
    let paths = AppPaths::at(dir.path().to_path_buf());
    paths.ensure_layout().await.unwrap();

    let tools: Vec<serde_json::Value> = ["alpha", "beta", "gamma"]
        .iter()
        .map(|id| {
            serde_json::json!({
                "id": id,
                "name": id,
                "detection": { "command": id },
                "sources": [{ "id": "primary", "name": "Primary", "url": format!("https://{id}.example.com/") }],
                "strategy": {
                    "type": "keyvalue",
                    "set": { "filePath": "~/.rc", "key": "registry", "value": "{{url}}" },
                    "get": { "filePath": "~/.rc", "key": "registry" }
                }
            })
        })
        .collect();
    let three_tools = serde_json::json!({
        "version": "1.0.0",
        "tools": tools
    })
    .to_string();

    // Seed an expired cache entry under the registered source's id.
    let now = Utc::now();
    let cache = CacheStore::new(paths.cache_dir());
    cache
        .write(
            "corp",
            &three_tools,
            &CacheMetadata {
                etag: Some("\"rev7\"".into()),
                last_modified: None,
                cached_at: now - chrono::Duration::hours(2),
                expiry: now - chrono::Duration::hours(1),
                version: Some("1.0.0".into()),
            },
        )
        .await
        .unwrap();

    let registry = SourceRegistry::new(paths.source_registry());
    registry
        .add(RegisteredSource {
            id: "corp".into(),
            name: "Corp".into(),
            kind: RegisteredKind::Remote,
            location: "https://mirrors.corp.example.com/tools.json".into(),
            enabled: true,
        })
        .await
        .unwrap();

    let loader = loader_for(&paths, Arc::new(StaticFetch {
        status: 304,
        body: "",
        etag: None,
    }))
    .await
    .unwrap();
    let merged = loader.load().await;

    for id in ["alpha", "beta", "gamma"] {
        assert!(merged.tool(id).is_some(), "{id} missing after 304 reuse");
    }
}
