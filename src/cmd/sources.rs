//! `mirrorswitch sources`: manage registered configuration sources.

use console::style;

use crate::cli::{AuditArgs, RegisterArgs, SourcesArgs, SourcesCommand, UnregisterArgs};
use crate::config::audit::{AuditLog, LoadOutcome};
use crate::config::registry::{RegisteredKind, RegisteredSource, SourceRegistry};
use crate::config::validation::validate_source_url;
use crate::error::MirrorSwitchError;
use crate::paths::AppPaths;

pub async fn execute(args: &SourcesArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    paths.ensure_layout().await?;
    let registry = SourceRegistry::new(paths.source_registry());

    match &args.command {
        SourcesCommand::Register(register) => add(register, &registry).await,
        SourcesCommand::Unregister(unregister) => remove(unregister, &registry).await,
        SourcesCommand::List => list(&registry).await,
        SourcesCommand::Audit(audit) => tail(audit, paths).await,
    }
}

async fn add(args: &RegisterArgs, registry: &SourceRegistry) -> Result<(), MirrorSwitchError> {
    let kind = if args.location.starts_with("http://") || args.location.starts_with("https://") {
        validate_source_url(&args.location).map_err(MirrorSwitchError::parse)?;
        RegisteredKind::Remote
    } else {
        RegisteredKind::Local
    };

    registry
        .add(RegisteredSource {
            id: args.id.clone(),
            name: args.name.clone().unwrap_or_else(|| args.id.clone()),
            kind,
            location: args.location.clone(),
            enabled: true,
        })
        .await?;

    let kind_label = match kind {
        RegisteredKind::Local => "local file",
        RegisteredKind::Remote => "remote URL",
    };
    println!(
        "{} registered {} ({kind_label}: {})",
        style("\u{2713}").green(),
        style(&args.id).bold(),
        args.location
    );
    Ok(())
}

async fn remove(args: &UnregisterArgs, registry: &SourceRegistry) -> Result<(), MirrorSwitchError> {
    registry.remove(&args.id).await?;
    println!("{} unregistered {}", style("\u{2713}").green(), args.id);
    Ok(())
}

async fn list(registry: &SourceRegistry) -> Result<(), MirrorSwitchError> {
    let sources = registry.list().await?;
    if sources.is_empty() {
        println!("No configuration sources registered. The builtin configuration is always active.");
        return Ok(());
    }

    println!("{}", style("Registered configuration sources:").bold());
    for source in &sources {
        let kind = match source.kind {
            RegisteredKind::Local => "local",
            RegisteredKind::Remote => "remote",
        };
        let state = if source.enabled {
            style("enabled").green()
        } else {
            style("disabled").dim()
        };
        println!("  {:<12} {kind:<7} {state}  {}", source.id, source.location);
    }
    Ok(())
}

async fn tail(args: &AuditArgs, paths: &AppPaths) -> Result<(), MirrorSwitchError> {
    let log = AuditLog::new(paths.audit_log());
    let records = log.tail(args.limit).await;

    if records.is_empty() {
        println!("No load attempts recorded yet.");
        return Ok(());
    }

    for record in &records {
        let outcome = match record.outcome {
            LoadOutcome::Success => style("ok").green(),
            LoadOutcome::Failure => style("failed").red(),
        };
        print!(
            "{}  {:<12} {outcome}",
            record.timestamp.format("%Y-%m-%d %H:%M:%S"),
            record.source_id
        );
        if let Some(tools) = record.tools {
            print!("  {tools} tools");
        }
        if let Some(ref message) = record.message {
            print!("  {}", style(message).dim());
        }
        println!();
    }
    Ok(())
}
