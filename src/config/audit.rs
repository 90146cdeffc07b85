//! Append-only audit log of configuration load attempts.
//!
//! Every source the loader touches, success or failure, leaves one
//! JSONL record with a timestamp and the source identity. Audit
//! failures are logged and swallowed; they must never fail a load.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadOutcome {
    Success,
    Failure,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub source_id: String,
    pub source_name: String,
    pub builtin: bool,
    pub outcome: LoadOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<usize>,
    /// SHA-256 of the decoded payload, for tracing which revision of a
    /// remote document actually landed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuditLog {
    path: PathBuf,
}

impl AuditLog {
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub async fn record(&self, record: &AuditRecord) {
        let Ok(mut line) = serde_json::to_string(record) else {
            return;
        };
        line.push('\n');

        let result = async {
            if let Some(parent) = self.path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let mut file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .await?;
            file.write_all(line.as_bytes()).await
        }
        .await;

        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "audit log append failed");
        }
    }

    /// Most recent records, newest last.
    pub async fn tail(&self, limit: usize) -> Vec<AuditRecord> {
        let Ok(content) = tokio::fs::read_to_string(&self.path).await else {
            return Vec::new();
        };
        let records: Vec<AuditRecord> = content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect();
        let skip = records.len().saturating_sub(limit);
        records.into_iter().skip(skip).collect()
    }
}
