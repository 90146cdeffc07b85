//! Concrete [`ConfigSource`](super::ConfigSource) implementations.
//!
//! Three origins contribute tool definitions: the embedded builtin
//! constant, user-registered local files, and remote URLs with
//! ETag-based caching. [`parse_tools_config`] is the shared JSON
//! decode step; [`sha256_hex`] fingerprints payloads for the audit log.

pub mod builtin;
pub mod file_source;
pub mod remote;

use sha2::{Digest, Sha256};

use crate::config::model::ToolsConfiguration;
use crate::error::MirrorSwitchError;

/// Decode a JSON tools-configuration document.
pub fn parse_tools_config(
    content: &str,
    label: &str,
) -> Result<ToolsConfiguration, MirrorSwitchError> {
    serde_json::from_str(content)
        .map_err(|e| MirrorSwitchError::parse(format!("{label}: {e}")))
}

/// Compute a lowercase hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(data: &[u8]) -> String {
    format!("{:x}", Sha256::digest(data))
}
