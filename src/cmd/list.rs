//! `mirrorswitch list`: show configured tools and their sources.

use console::style;

use crate::cli::ListArgs;
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn execute(args: &ListArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let orchestrator = super::build_orchestrator(paths).await?;
    let config = orchestrator.config().await;

    let tools: Vec<_> = match &args.tool {
        Some(id) => {
            let tool = config
                .tool(id)
                .ok_or_else(|| MirrorSwitchError::ToolNotFound(id.clone()))?;
            vec![tool.clone()]
        }
        None => config.tools.clone(),
    };

    for tool in &tools {
        let selected = orchestrator.selection(&tool.id).await?;

        print!("{} ({})", style(&tool.name).bold(), tool.id);
        if args.installed {
            let installation = orchestrator.detect_installation(&tool.id).await?;
            if installation.installed {
                match installation.version {
                    Some(version) => print!("  {} {version}", style("\u{2713}").green()),
                    None => print!("  {}", style("\u{2713} installed").green()),
                }
            } else {
                print!("  {}", style("\u{2717} not installed").red());
            }
        }
        println!();

        if let Some(ref description) = tool.description {
            println!("  {}", style(description).dim());
        }

        for source in &tool.sources {
            let marker = if selected.as_deref() == Some(source.id.as_str()) {
                style("*").green().to_string()
            } else {
                " ".to_string()
            };
            print!("  {marker} {:<12} {}", source.id, source.url);
            if let Some(ref region) = source.region {
                print!("  [{region}]");
            }
            if source.config_source_is_builtin == Some(false) {
                if let Some(ref from) = source.config_source_name {
                    print!("  {}", style(format!("(from {from})")).dim());
                }
            }
            println!();
        }
        println!();
    }

    Ok(())
}
