//! Tool installation detection and current-source matching.
//!
//! Installation is probed with the tool's version command first; when
//! that command is missing or fails, the configured custom paths and
//! the fallback check (file, app bundle, environment variable, or
//! script) are tried in turn. Source matching compares the live value
//! read from the strategy target against each configured mirror URL.

use std::sync::Arc;
use std::time::Duration;

use crate::config::model::{DetectionConfiguration, FallbackDetection, SourceConfiguration};
use crate::runner::{CommandRunner, RunOptions};

/// Version probes should answer quickly; a wedged CLI is as good as
/// absent for detection purposes.
const DETECTION_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    pub installed: bool,
    /// First line of the version command's output, when it ran.
    pub version: Option<String>,
}

impl Installation {
    const fn absent() -> Self {
        Self {
            installed: false,
            version: None,
        }
    }
}

pub struct Detector {
    runner: Arc<dyn CommandRunner>,
}

impl Detector {
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner }
    }

    pub async fn detect(&self, detection: &DetectionConfiguration) -> Installation {
        let options = RunOptions {
            timeout: Some(DETECTION_TIMEOUT),
            ..RunOptions::default()
        };

        match self
            .runner
            .run(&detection.command, &detection.arguments, &options)
            .await
        {
            Ok(output) if output.success() => {
                let version = output
                    .stdout
                    .lines()
                    .next()
                    .map(str::trim)
                    .filter(|line| !line.is_empty())
                    .map(str::to_string);
                return Installation {
                    installed: true,
                    version,
                };
            }
            Ok(output) => {
                tracing::debug!(
                    command = %detection.command,
                    exit_code = output.exit_code,
                    "version probe failed, trying fallbacks"
                );
            }
            Err(e) => {
                tracing::debug!(command = %detection.command, error = %e, "version probe unavailable");
            }
        }

        for raw in &detection.custom_paths {
            let path = shellexpand::tilde(raw).into_owned();
            if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                return Installation {
                    installed: true,
                    version: None,
                };
            }
        }

        match &detection.fallback_detection {
            Some(fallback) if self.fallback_hits(fallback).await => Installation {
                installed: true,
                version: None,
            },
            _ => Installation::absent(),
        }
    }

    async fn fallback_hits(&self, fallback: &FallbackDetection) -> bool {
        match fallback {
            FallbackDetection::FileExists { path } | FallbackDetection::AppBundle { path } => {
                let expanded = shellexpand::tilde(path).into_owned();
                tokio::fs::try_exists(&expanded).await.unwrap_or(false)
            }
            FallbackDetection::EnvironmentVariable { name } => {
                std::env::var(name).is_ok_and(|v| !v.is_empty())
            }
            FallbackDetection::Script { command, arguments } => {
                let options = RunOptions {
                    timeout: Some(DETECTION_TIMEOUT),
                    ..RunOptions::default()
                };
                self.runner
                    .run(command, arguments, &options)
                    .await
                    .map(|output| output.success())
                    .unwrap_or(false)
            }
        }
    }
}

/// Find the configured source the live value points at.
///
/// A source matches when its URL appears inside the live value
/// (ignoring trailing slashes), or failing that when both parse as
/// URLs with the same host. Containment is one-directional: a short
/// live fragment must not claim the first source whose URL happens to
/// contain it. `None` means the tool is pointed somewhere this
/// configuration does not know about.
#[must_use]
pub fn match_source<'a>(
    current: &str,
    sources: &'a [SourceConfiguration],
) -> Option<&'a SourceConfiguration> {
    let live = current.trim().trim_end_matches('/');
    if live.is_empty() {
        return None;
    }

    for source in sources {
        let url = source.url.trim().trim_end_matches('/');
        if live == url || live.contains(url) {
            return Some(source);
        }
    }

    let live_host = url::Url::parse(current.trim())
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))?;
    sources.iter().find(|source| {
        url::Url::parse(&source.url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .is_some_and(|host| host == live_host)
    })
}
