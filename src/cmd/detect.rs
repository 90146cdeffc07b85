//! `mirrorswitch detect`: check whether a tool is installed.

use console::style;

use crate::cli::DetectArgs;
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn execute(args: &DetectArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;
    let installation = orchestrator.detect_installation(&args.tool).await?;

    if installation.installed {
        match installation.version {
            Some(version) => println!(
                "{} {} is installed ({version})",
                style("\u{2713}").green(),
                style(&args.tool).bold()
            ),
            None => println!(
                "{} {} is installed",
                style("\u{2713}").green(),
                style(&args.tool).bold()
            ),
        }
    } else {
        println!(
            "{} {} does not appear to be installed",
            style("\u{2717}").red(),
            style(&args.tool).bold()
        );
    }

    Ok(())
}
