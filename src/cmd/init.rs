//! `mirrorswitch init`: write a starter tools configuration file.
//!
//! Exports the builtin configuration as JSON so users have a complete,
//! valid document to edit and register, instead of writing the schema
//! from scratch.

use console::style;

use crate::cli::InitArgs;
use crate::config::sources::builtin;
use crate::error::MirrorSwitchError;

pub fn execute(args: &InitArgs) -> Result<(), MirrorSwitchError> {
    if args.output.exists() && !args.force {
        return Err(MirrorSwitchError::SwitchFailed {
            reason: format!(
                "{} already exists (use --force to overwrite)",
                args.output.display()
            ),
        });
    }

    let config = builtin::configuration();
    let mut content = serde_json::to_string_pretty(&config)
        .map_err(|e| MirrorSwitchError::parse(e.to_string()))?;
    content.push('\n');

    std::fs::write(&args.output, content)?;

    println!(
        "{} wrote {} ({} tools)",
        style("\u{2713}").green(),
        args.output.display(),
        config.tools.len()
    );
    println!(
        "  edit it, then register it with:\n    mirrorswitch sources register mine {}",
        args.output.display()
    );

    Ok(())
}
