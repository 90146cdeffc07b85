//! Serde data structures for the tools configuration document.
//!
//! Contains [`ToolsConfiguration`] (the root), [`ToolConfiguration`],
//! [`SourceConfiguration`], [`DetectionConfiguration`], and the
//! [`StrategyConfiguration`] tagged union with its five variants.
//! These types carry no behavior beyond trivial accessors; all
//! invariant checking lives in [`validation`](super::validation).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

fn default_separator() -> String {
    "=".to_string()
}

fn is_default_separator(v: &str) -> bool {
    v == "="
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_zero(v: &usize) -> bool {
    *v == 0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ToolsConfiguration {
    pub version: String,
    pub tools: Vec<ToolConfiguration>,
}

impl ToolsConfiguration {
    #[must_use]
    pub fn tool(&self, id: &str) -> Option<&ToolConfiguration> {
        self.tools.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn total_sources(&self) -> usize {
        self.tools.iter().map(|t| t.sources.len()).sum()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ToolConfiguration {
    pub id: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub detection: DetectionConfiguration,

    pub sources: Vec<SourceConfiguration>,

    pub strategy: StrategyConfiguration,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<BackupConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, String>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub post_actions: Vec<PostAction>,
}

impl ToolConfiguration {
    #[must_use]
    pub fn source(&self, id: &str) -> Option<&SourceConfiguration> {
        self.sources.iter().find(|s| s.id == id)
    }
}

/// One candidate mirror a tool can be pointed at.
///
/// The `config_source_*` fields are provenance metadata stamped by the
/// loader when merging multiple configuration sources; they are never
/// authored by hand and never read by the strategy layer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SourceConfiguration {
    pub id: String,

    pub name: String,

    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_auth: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthConfiguration>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_source_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_source_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_source_is_builtin: Option<bool>,
}

/// Opaque credentials passed through to command templates; never
/// interpreted by mirrorswitch itself.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AuthConfiguration {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DetectionConfiguration {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub custom_paths: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_detection: Option<FallbackDetection>,
}

/// Secondary installation check, tried when the primary detection
/// command fails or is absent from PATH.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FallbackDetection {
    FileExists {
        path: String,
    },
    AppBundle {
        path: String,
    },
    EnvironmentVariable {
        name: String,
    },
    Script {
        command: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        arguments: Vec<String>,
    },
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct BackupConfiguration {
    pub file_path: String,

    pub backup_file_name: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub backup_original: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_backup_suffix: Option<String>,
}

/// Command run after a successful switch (e.g. restarting a daemon so
/// the new mirror takes effect).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PostAction {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The mechanism by which a tool's mirror setting is read and written.
///
/// Closed tagged union: adding a sixth kind is a compile-time exercise
/// (every `match` over this enum is exhaustive).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StrategyConfiguration {
    Command { set: CommandSet, get: CommandGet },
    Xml { set: XmlSet, get: XmlGet },
    Jsonpath { set: JsonPathSet, get: JsonPathGet },
    Regex { set: RegexSet, get: RegexGet },
    Keyvalue { set: KeyValueSet, get: KeyValueGet },
}

impl StrategyConfiguration {
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Command { .. } => "command",
            Self::Xml { .. } => "xml",
            Self::Jsonpath { .. } => "jsonpath",
            Self::Regex { .. } => "regex",
            Self::Keyvalue { .. } => "keyvalue",
        }
    }

    /// The file this strategy mutates, if it is file-backed at all.
    /// Command strategies have no file target (backup is unsupported).
    #[must_use]
    pub fn target_file(&self) -> Option<&str> {
        match self {
            Self::Command { .. } => None,
            Self::Xml { set, .. } => Some(&set.file_path),
            Self::Jsonpath { set, .. } => Some(&set.file_path),
            Self::Regex { set, .. } => Some(&set.file_path),
            Self::Keyvalue { set, .. } => Some(&set.file_path),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandSet {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub environment: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub requires_admin: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_directory: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pre_commands: Vec<PreCommand>,

    /// Seconds; falls back to the runner default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CommandGet {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    #[serde(default)]
    pub output_parser: OutputParser,

    /// Pattern consumed only when `output_parser` is `regex`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_pattern: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

/// Precursor command whose parsed output is captured into the template
/// variable context under `capture_as`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PreCommand {
    pub command: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub arguments: Vec<String>,

    pub capture_as: String,

    #[serde(default)]
    pub output_parser: OutputParser,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser_pattern: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OutputParser {
    #[default]
    Trim,
    ExtractUrl,
    ExtractDomain,
    FirstLine,
    Json,
    Regex,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct XmlSet {
    pub file_path: String,

    /// XPath-lite: `//parent/child/leaf` element-name chain, no predicates.
    pub xpath: String,

    pub value: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub namespaces: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure_structure: Option<EnsureStructure>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct XmlGet {
    pub file_path: String,

    pub xpath: String,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub namespaces: HashMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnsureStructure {
    #[serde(default, skip_serializing_if = "is_false")]
    pub create_if_missing: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_structure: Option<String>,

    #[serde(default, skip_serializing_if = "is_false")]
    pub create_parent_directories: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JsonPathSet {
    pub file_path: String,

    /// Dot-separated object path, e.g. `registry-mirrors` or `a.b.c`.
    pub jsonpath: String,

    pub value: serde_json::Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merge_strategy: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ensure_structure: Option<EnsureStructure>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JsonPathGet {
    pub file_path: String,

    pub jsonpath: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegexSet {
    pub file_path: String,

    pub pattern: String,

    /// May reference capture groups (`$1`).
    pub replacement: String,

    #[serde(default, skip_serializing_if = "is_false")]
    pub global: bool,

    /// `caseInsensitive`, `multiline`, `dotMatchesLineSeparators`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RegexGet {
    pub file_path: String,

    pub pattern: String,

    /// 0 = whole match.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub capture_group: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyValueSet {
    pub file_path: String,

    pub key: String,

    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    #[serde(
        default = "default_separator",
        skip_serializing_if = "is_default_separator"
    )]
    pub separator: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct KeyValueGet {
    pub file_path: String,

    pub key: String,

    #[serde(
        default = "default_separator",
        skip_serializing_if = "is_default_separator"
    )]
    pub separator: String,
}
