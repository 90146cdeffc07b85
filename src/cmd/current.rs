//! `mirrorswitch current`: show where a tool points today.

use console::style;

use crate::cli::CurrentArgs;
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn execute(args: &CurrentArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;
    let status = orchestrator.detect_current_source(&args.tool).await?;

    match status.matched {
        Some(source) => {
            println!(
                "{} {} \u{2192} {} ({})",
                style("\u{2713}").green(),
                style(&args.tool).bold(),
                style(&source.name).bold(),
                source.url
            );
        }
        None if status.value.trim().is_empty() => {
            println!(
                "{} {} has no mirror configured",
                style("?").yellow(),
                style(&args.tool).bold()
            );
        }
        None => {
            println!(
                "{} {} points at an unknown location: {}",
                style("?").yellow(),
                style(&args.tool).bold(),
                status.value.trim()
            );
        }
    }

    Ok(())
}
