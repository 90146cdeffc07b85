//! `mirrorswitch path`: manage custom install roots.

use console::style;

use crate::cli::{PathArgs, PathCommand};
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn execute(args: &PathArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;

    match &args.command {
        PathCommand::Set { tool, root } => {
            orchestrator.set_custom_path(tool, root).await?;
            println!(
                "{} {} config files will be looked for under {root}",
                style("\u{2713}").green(),
                style(tool).bold()
            );
        }
        PathCommand::Clear { tool } => {
            orchestrator.clear_custom_path(tool).await?;
            println!(
                "{} {} custom path cleared",
                style("\u{2713}").green(),
                style(tool).bold()
            );
        }
    }

    Ok(())
}
