//! `mirrorswitch backup` and `mirrorswitch restore`: save and bring
//! back a tool's configuration file.

use console::style;

use crate::cli::{BackupArgs, RestoreArgs};
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn backup(args: &BackupArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;
    let path = orchestrator.backup(&args.tool).await?;
    println!(
        "{} {} backed up to {}",
        style("\u{2713}").green(),
        style(&args.tool).bold(),
        path.display()
    );
    Ok(())
}

pub async fn restore(args: &RestoreArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;
    let from = orchestrator.restore(&args.tool).await?;
    println!(
        "{} {} restored from {}",
        style("\u{2713}").green(),
        style(&args.tool).bold(),
        from.display()
    );
    Ok(())
}
