//! Unified error types for mirrorswitch.
//!
//! Defines [`MirrorSwitchError`] (the main crate error enum) and
//! [`ValidationError`] for configuration validation failures. Both use
//! `thiserror` for `Display` and `Error` derives. Error messages
//! include contextual hints to guide the user toward a fix.

use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub tool: String,
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  tool {}: {}: {}", self.tool, self.field, self.message)?;
        if let Some(ref suggestion) = self.suggestion {
            write!(f, " ({suggestion})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

fn format_errors(errors: &[ValidationError]) -> String {
    use std::fmt::Write;
    let mut buf = String::new();
    for (i, e) in errors.iter().enumerate() {
        if i > 0 {
            buf.push('\n');
        }
        // write! to String is infallible (only fails on OOM which is unrecoverable)
        let _ = write!(buf, "{e}");
    }
    buf
}

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MirrorSwitchError {
    #[error("Config file not found: {}", path.display())]
    ConfigNotFound { path: PathBuf },

    #[error("Parse failed: {reason}")]
    ParseFailed { reason: String },

    #[error("Config validation failed:\n{}", format_errors(.errors))]
    ValidationFailed { errors: Vec<ValidationError> },

    #[error("Unsupported configuration version '{version}' (expected {expected}x)")]
    VersionMismatch { version: String, expected: String },

    #[error("Template variable not found: '{name}'")]
    VariableNotFound { name: String },

    #[error("Executable not found: {command}")]
    ExecutableNotFound { command: String },

    #[error("Command failed{}: {stderr}", exit_code.map(|c| format!(" (exit {c})")).unwrap_or_default())]
    CommandExecutionFailed {
        stderr: String,
        exit_code: Option<i32>,
    },

    #[error("Unknown tool: '{0}'")]
    ToolNotFound(String),

    #[error("Unknown source: '{0}'")]
    SourceNotFound(String),

    #[error("No backup found to restore")]
    BackupNotFound,

    #[error("Tool '{0}' has no file-backed config to back up")]
    BackupNotSupported(String),

    #[error("Switch failed: {reason}")]
    SwitchFailed { reason: String },

    #[error("Network error: {source}")]
    Network {
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl MirrorSwitchError {
    pub fn parse(reason: impl Into<String>) -> Self {
        Self::ParseFailed {
            reason: reason.into(),
        }
    }

    pub fn network(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Network {
            source: Box::new(source),
        }
    }
}
