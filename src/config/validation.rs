//! Configuration validation with detailed error reporting.
//!
//! The [`validate`] function checks a parsed [`ToolsConfiguration`] for
//! structural errors such as an unsupported version, malformed or
//! duplicate tool ids, empty source lists, and target URLs that do not
//! parse to a scheme plus host. Returns a list of [`ValidationError`]
//! values with per-field suggestions.

use std::sync::OnceLock;

use regex::Regex;
use url::Url;

use super::model::ToolsConfiguration;
use crate::error::{MirrorSwitchError, ValidationError};

/// Major version prefix this loader understands.
pub const ACCEPTED_VERSION_PREFIX: &str = "1.";

fn tool_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // Anchored; the character class cannot fail to compile.
    PATTERN.get_or_init(|| Regex::new("^[a-z][a-z0-9-]*$").unwrap())
}

/// Validate a single tool id. Returns `Ok(())` or a human-readable error.
pub fn validate_tool_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("id cannot be empty".into());
    }
    if !tool_id_pattern().is_match(id) {
        return Err(format!(
            "'{id}' must match ^[a-z][a-z0-9-]*$ (lowercase letters, digits, hyphens)"
        ));
    }
    Ok(())
}

/// Validate a single mirror URL. Returns `Ok(())` or a human-readable error.
pub fn validate_source_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("url cannot be empty".into());
    }
    match Url::parse(url) {
        Ok(parsed) => {
            if parsed.scheme().is_empty() {
                Err(format!("'{url}' has no scheme"))
            } else if parsed.host_str().is_none() {
                Err(format!("'{url}' has no host"))
            } else {
                Ok(())
            }
        }
        Err(_) => Err(format!("'{url}' is not a valid URL")),
    }
}

/// Check the document version against the accepted major prefix.
pub fn check_version(version: &str) -> Result<(), MirrorSwitchError> {
    if version.starts_with(ACCEPTED_VERSION_PREFIX) {
        Ok(())
    } else {
        Err(MirrorSwitchError::VersionMismatch {
            version: version.to_string(),
            expected: ACCEPTED_VERSION_PREFIX.to_string(),
        })
    }
}

pub fn validate(config: &ToolsConfiguration) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !config.version.starts_with(ACCEPTED_VERSION_PREFIX) {
        errors.push(ValidationError {
            tool: "(root)".into(),
            field: "version".into(),
            message: format!(
                "unsupported version '{}' (expected {ACCEPTED_VERSION_PREFIX}x)",
                config.version
            ),
            suggestion: None,
        });
    }

    if config.tools.is_empty() {
        errors.push(ValidationError {
            tool: "(root)".into(),
            field: "tools".into(),
            message: "at least one tool must be defined".into(),
            suggestion: None,
        });
        return Err(errors);
    }

    let mut seen_ids = std::collections::HashSet::new();

    for (i, tool) in config.tools.iter().enumerate() {
        let tool_id = if tool.id.is_empty() {
            format!("tools[{i}]")
        } else {
            tool.id.clone()
        };

        if let Err(msg) = validate_tool_id(&tool.id) {
            errors.push(ValidationError {
                tool: tool_id.clone(),
                field: "id".into(),
                message: msg,
                suggestion: if tool.id.chars().any(|c| c.is_ascii_uppercase()) {
                    Some(format!("did you mean '{}'?", tool.id.to_lowercase()))
                } else {
                    None
                },
            });
        }

        if !seen_ids.insert(&tool.id) {
            errors.push(ValidationError {
                tool: tool_id.clone(),
                field: "id".into(),
                message: "duplicate tool id".into(),
                suggestion: None,
            });
        }

        if tool.sources.is_empty() {
            errors.push(ValidationError {
                tool: tool_id.clone(),
                field: "sources".into(),
                message: "at least one source must be defined".into(),
                suggestion: None,
            });
        }

        let mut seen_source_ids = std::collections::HashSet::new();
        for source in &tool.sources {
            if !seen_source_ids.insert(&source.id) {
                errors.push(ValidationError {
                    tool: tool_id.clone(),
                    field: "sources.id".into(),
                    message: format!("duplicate source id '{}'", source.id),
                    suggestion: None,
                });
            }

            if let Err(msg) = validate_source_url(&source.url) {
                errors.push(ValidationError {
                    tool: tool_id.clone(),
                    field: format!("sources[{}].url", source.id),
                    message: msg,
                    suggestion: None,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[must_use]
pub fn format_validation_report(path: &str, config: &ToolsConfiguration) -> String {
    let mut lines = vec![format!(
        "  version {}, {} tools, {} sources\n",
        config.version,
        config.tools.len(),
        config.total_sources()
    )];

    for tool in &config.tools {
        lines.push(format!(
            "  {}  -> {} sources ({} strategy)",
            tool.id,
            tool.sources.len(),
            tool.strategy.kind(),
        ));
        for source in &tool.sources {
            lines.push(format!("    {}: {}", source.id, source.url));
        }
    }

    format!("{} is valid\n{}", path, lines.join("\n"))
}
