//! `mirrorswitch switch`: point a tool at one of its sources.

use console::style;

use crate::cli::SwitchArgs;
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn execute(args: &SwitchArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;

    let report = orchestrator.switch_source(&args.tool, &args.source).await?;

    println!(
        "{} {} now points at {} ({})",
        style("\u{2713}").green(),
        style(&report.tool_id).bold(),
        report.source_name,
        report.url
    );
    if let Some(ref backup) = report.backup_path {
        println!("  previous config backed up to {}", backup.display());
    }

    Ok(())
}
