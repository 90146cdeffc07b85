//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function initializes logging, resolves the data
//! directory, and routes the parsed CLI to the appropriate subcommand
//! handler. Each handler lives in its own submodule.

pub mod backup;
pub mod current;
pub mod detect;
pub mod init;
pub mod list;
pub mod path;
pub mod sources;
pub mod speed;
pub mod switch;
pub mod validate;

use std::sync::Arc;

use crate::cli::{Cli, Commands};
use crate::client::{build_http_client, HttpFetch, HyperFetch};
use crate::config::audit::AuditLog;
use crate::config::registry::SourceRegistry;
use crate::config::ConfigLoader;
use crate::error::MirrorSwitchError;
use crate::logging;
use crate::orchestrator::Orchestrator;
use crate::paths::AppPaths;
use crate::runner::{CommandRunner, TokioRunner};

pub async fn dispatch(cli: Cli) -> Result<(), MirrorSwitchError> {
    let log_format = logging::resolve_format(cli.pretty, cli.json);
    logging::init(&cli.log_level, log_format);

    let paths = match cli.data_dir {
        Some(root) => AppPaths::at(root),
        None => AppPaths::default_root()?,
    };

    match cli.command {
        Some(Commands::List(ref args)) => list::execute(args, &paths).await,
        Some(Commands::Switch(ref args)) => switch::execute(args, &paths).await,
        Some(Commands::Current(ref args)) => current::execute(args, &paths).await,
        Some(Commands::Detect(ref args)) => detect::execute(args, &paths).await,
        Some(Commands::TestSpeed(ref args)) => speed::execute(args, &paths).await,
        Some(Commands::Backup(ref args)) => backup::backup(args, &paths).await,
        Some(Commands::Restore(ref args)) => backup::restore(args, &paths).await,
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Sources(ref args)) => sources::execute(args, &paths).await,
        Some(Commands::Path(ref args)) => path::execute(args, &paths).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

/// Wire the full application together for one command invocation.
pub(crate) async fn build_orchestrator(
    paths: &AppPaths,
) -> Result<Orchestrator, MirrorSwitchError> {
    paths.ensure_layout().await?;

    let fetch: Arc<dyn HttpFetch> = Arc::new(HyperFetch::new(build_http_client()));
    let runner: Arc<dyn CommandRunner> = Arc::new(TokioRunner);

    let registry = SourceRegistry::new(paths.source_registry());
    let audit = AuditLog::new(paths.audit_log());
    let loader =
        ConfigLoader::from_registry(&registry, paths.cache_dir(), Arc::clone(&fetch), audit)
            .await?;

    Ok(Orchestrator::new(loader, paths, fetch, runner).await)
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("MIRRORSWITCH_GIT_SHORT");
    let profile = env!("MIRRORSWITCH_BUILD_PROFILE");
    println!(
        "\n  mirrorswitch v{version} ({commit}, {profile}, {}) \u{2014} switch package-manager mirrors from one place\n\n  \
         No command provided. To get started:\n\n    \
         mirrorswitch list                     Show configured tools and sources\n    \
         mirrorswitch current npm              See where npm points today\n    \
         mirrorswitch test-speed npm           Race the configured mirrors\n    \
         mirrorswitch switch npm npmmirror     Point npm at a mirror\n    \
         mirrorswitch --help                   See all commands and options\n",
        env!("MIRRORSWITCH_TARGET")
    );
}
