//! Command-line interface definitions using clap derive macros.
//!
//! Contains the top-level [`Cli`] parser and the [`Commands`] enum for
//! subcommands. Global flags control logging and the data directory;
//! each has an environment variable equivalent for scripting.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(
    name = "mirrorswitch",
    version,
    about = "Switch package-manager registries and mirrors from one place",
    propagate_version = true,
    after_help = "\x1b[1mQuick start:\x1b[0m\n  \
        mirrorswitch list                         Show configured tools\n  \
        mirrorswitch current npm                  Where npm points today\n  \
        mirrorswitch test-speed npm               Race the configured mirrors\n  \
        mirrorswitch switch npm npmmirror         Point npm at a mirror"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (registry, cache, backups, state)
    #[arg(long, global = true, env = "MIRRORSWITCH_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log level
    #[arg(short, long, global = true, env = "MIRRORSWITCH_LOG_LEVEL", default_value = "warn")]
    pub log_level: LogLevel,

    /// Force pretty (human-readable) log output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Force JSON log output (overrides TTY detection)
    #[arg(long, global = true, conflicts_with = "pretty")]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List configured tools and their mirror sources
    List(ListArgs),

    /// Point a tool at one of its configured sources
    Switch(SwitchArgs),

    /// Show which source a tool currently points at
    Current(CurrentArgs),

    /// Check whether a tool is installed
    Detect(DetectArgs),

    /// Probe every source of a tool and rank them by latency
    TestSpeed(TestSpeedArgs),

    /// Back up a tool's configuration file
    Backup(BackupArgs),

    /// Restore a tool's configuration file from its backup
    Restore(RestoreArgs),

    /// Validate a tools configuration file without loading it
    Validate(ValidateArgs),

    /// Write a starter tools configuration file
    Init(InitArgs),

    /// Manage registered configuration sources
    Sources(SourcesArgs),

    /// Manage custom install paths for tools
    Path(PathArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Probe each tool's install state as well (slower)
    #[arg(long)]
    pub installed: bool,

    /// Only show this tool
    pub tool: Option<String>,
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        mirrorswitch switch npm npmmirror          Use the npmmirror registry\n  \
        mirrorswitch switch docker daocloud        Point dockerd at DaoCloud\n  \
        mirrorswitch switch npm npmjs              Back to the official registry")]
pub struct SwitchArgs {
    /// Tool id (see `mirrorswitch list`)
    pub tool: String,

    /// Source id to switch to
    pub source: String,
}

#[derive(Args)]
pub struct CurrentArgs {
    /// Tool id
    pub tool: String,
}

#[derive(Args)]
pub struct DetectArgs {
    /// Tool id
    pub tool: String,
}

#[derive(Args)]
pub struct TestSpeedArgs {
    /// Tool id
    pub tool: String,
}

#[derive(Args)]
pub struct BackupArgs {
    /// Tool id
    pub tool: String,
}

#[derive(Args)]
pub struct RestoreArgs {
    /// Tool id
    pub tool: String,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Configuration file to validate
    pub config: PathBuf,

    /// Output format
    #[arg(long, default_value = "text")]
    pub format: ValidateFormat,
}

#[derive(Args)]
pub struct InitArgs {
    /// Output file path
    #[arg(short, long, default_value = "mirrorswitch-tools.json")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args)]
pub struct SourcesArgs {
    #[command(subcommand)]
    pub command: SourcesCommand,
}

#[derive(Subcommand)]
pub enum SourcesCommand {
    /// Register a local file or remote URL configuration source
    Register(RegisterArgs),

    /// Unregister a configuration source
    Unregister(UnregisterArgs),

    /// List registered configuration sources
    List,

    /// Show recent configuration load attempts
    Audit(AuditArgs),
}

#[derive(Args)]
#[command(after_help = "\x1b[1mExamples:\x1b[0m\n  \
        mirrorswitch sources register team ~/team-tools.json\n  \
        mirrorswitch sources register corp https://mirrors.corp.example.com/tools.json")]
pub struct RegisterArgs {
    /// Short id for the source
    pub id: String,

    /// File path or http(s) URL
    pub location: String,

    /// Human-readable name (defaults to the id)
    #[arg(long)]
    pub name: Option<String>,
}

#[derive(Args)]
pub struct UnregisterArgs {
    /// Source id to remove
    pub id: String,
}

#[derive(Args)]
pub struct AuditArgs {
    /// Number of records to show
    #[arg(long, default_value_t = 20)]
    pub limit: usize,
}

#[derive(Args)]
pub struct PathArgs {
    #[command(subcommand)]
    pub command: PathCommand,
}

#[derive(Subcommand)]
pub enum PathCommand {
    /// Record a custom install root for a tool
    Set {
        /// Tool id
        tool: String,
        /// Install root to probe for the tool's config file
        root: String,
    },

    /// Forget a tool's custom install root
    Clear {
        /// Tool id
        tool: String,
    },
}

#[derive(Clone, Debug, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    #[must_use]
    pub const fn to_tracing_level(&self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

#[derive(Clone, Debug, ValueEnum)]
pub enum ValidateFormat {
    Text,
    Json,
}
