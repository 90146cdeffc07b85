//! `mirrorswitch test-speed`: race a tool's mirrors.

use console::style;

use crate::cli::TestSpeedArgs;
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;
use crate::speed::ProbeMethod;

pub async fn execute(args: &TestSpeedArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;
    let results = orchestrator.test_speed(&args.tool).await?;

    println!("{}", style(format!("Speed test for {}:", args.tool)).bold());
    for result in &results {
        match result.latency_ms {
            Some(latency) => {
                let method = match result.method {
                    Some(ProbeMethod::Ping) => " (ping)",
                    _ => "",
                };
                println!(
                    "  {} {:<12} {:>6} ms{method}  {}",
                    style("\u{2713}").green(),
                    result.source_id,
                    latency,
                    style(&result.url).dim()
                );
            }
            None => {
                println!(
                    "  {} {:<12} unreachable  {}",
                    style("\u{2717}").red(),
                    result.source_id,
                    style(result.error.as_deref().unwrap_or("no answer")).dim()
                );
            }
        }
    }

    if let Some(fastest) = results.iter().find(|r| r.reachable()) {
        println!(
            "\nFastest: {} \u{2014} switch with `mirrorswitch switch {} {}`",
            style(&fastest.source_id).bold(),
            args.tool,
            fastest.source_id
        );
    }

    Ok(())
}
