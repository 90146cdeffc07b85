//! `mirrorswitch validate`: check a tools configuration file.
//!
//! Parses and validates the document, reporting results in either
//! human-readable text or machine-readable JSON format. Useful before
//! registering a file or publishing one to a team URL.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::sources::parse_tools_config;
use crate::config::validation;
use crate::error::MirrorSwitchError;

pub fn execute(args: &ValidateArgs) -> Result<(), MirrorSwitchError> {
    let path = &args.config;

    if !path.exists() {
        return Err(MirrorSwitchError::ConfigNotFound { path: path.clone() });
    }

    let content = std::fs::read_to_string(path)?;
    let config = parse_tools_config(&content, &path.display().to_string())?;

    validation::check_version(&config.version)?;

    if let Err(errors) = validation::validate(&config) {
        match args.format {
            ValidateFormat::Text => {
                eprintln!("\u{2717} {} has {} errors\n", path.display(), errors.len());
                for error in &errors {
                    eprintln!("{error}");
                }
            }
            ValidateFormat::Json => {
                let json_errors: Vec<serde_json::Value> = errors
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "tool": e.tool,
                            "field": e.field,
                            "message": e.message,
                            "suggestion": e.suggestion,
                        })
                    })
                    .collect();
                println!(
                    "{}",
                    serde_json::json!({
                        "valid": false,
                        "errors": json_errors,
                    })
                );
            }
        }
        return Err(MirrorSwitchError::ValidationFailed { errors });
    }

    match args.format {
        ValidateFormat::Text => {
            println!(
                "\u{2713} {}",
                validation::format_validation_report(&path.display().to_string(), &config)
            );
        }
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "tools": config.tools.len(),
                    "sources": config.total_sources(),
                })
            );
        }
    }

    Ok(())
}
