//! Mirrorswitch switches package-manager registries and mirrors from
//! one place.
//!
//! Tools like npm, Docker, Maven, or RubyGems each keep their registry
//! setting in a different file format and location. Mirrorswitch
//! describes every tool declaratively (where its config lives, how to
//! read and write the mirror value, which mirrors exist) and drives
//! the switch, backup, detection, and speed-test workflows off that
//! description.
//!
//! # Architecture
//!
//! - [`cli`] -- Command-line argument parsing with clap derive macros.
//! - [`cmd`] -- Subcommand dispatch and execution.
//! - [`config`] -- Configuration loading, validation, merging, and
//!   caching via the [`ConfigSource`](config::ConfigSource) trait.
//! - [`strategy`] -- The five write/read strategies (command, XML,
//!   JSON path, regex, key-value) behind [`strategy::StrategyExecutor`].
//! - [`orchestrator`] -- Coordination layer tying strategies, backups,
//!   detection, and persisted state together.
//! - [`template`] -- `{{variable}}` resolution for strategy values.
//! - [`runner`] -- Subprocess execution seam.
//! - [`client`] -- Hyper HTTPS client and the [`client::HttpFetch`] seam.
//! - [`backup`] -- Target-file backup and restore.
//! - [`detect`] -- Installation detection and current-source matching.
//! - [`speed`] -- Concurrent mirror latency probing.
//! - [`state`] -- Persisted selections and custom install paths.
//! - [`paths`] -- Per-user data directory layout.
//! - [`error`] -- Unified error types using `thiserror`.
//! - [`logging`] -- Structured tracing setup with JSON and pretty output.

// Binary crate; public functions are internal, not consumed by external users.
#![allow(clippy::missing_errors_doc)]

pub mod backup;
pub mod cli;
pub mod client;
pub mod cmd;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod paths;
pub mod runner;
pub mod speed;
pub mod state;
pub mod strategy;
pub mod template;
