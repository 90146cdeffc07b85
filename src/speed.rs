//! Concurrent reachability and latency probing of mirror sources.
//!
//! Every source of a tool is probed in parallel: an HTTP `HEAD` first,
//! and when that fails (some mirrors reject `HEAD` outright or sit
//! behind plain TCP), one ICMP ping as a fallback. Results are
//! collected and sorted fastest-first; an unreachable source is a
//! result, not an error.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::client::HttpFetch;
use crate::config::model::SourceConfiguration;
use crate::runner::{CommandRunner, RunOptions};

/// Per-probe ceiling. A mirror slower than this loses regardless.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

/// Probes running at once. Mirror lists are short, this only matters
/// when several tools are tested back to back.
const MAX_IN_FLIGHT: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMethod {
    Head,
    Ping,
}

#[derive(Debug, Clone)]
pub struct SpeedResult {
    pub source_id: String,
    pub source_name: String,
    pub url: String,
    pub latency_ms: Option<u64>,
    pub method: Option<ProbeMethod>,
    pub error: Option<String>,
}

impl SpeedResult {
    #[must_use]
    pub const fn reachable(&self) -> bool {
        self.latency_ms.is_some()
    }
}

pub struct SpeedTester {
    fetch: Arc<dyn HttpFetch>,
    runner: Arc<dyn CommandRunner>,
}

impl SpeedTester {
    #[must_use]
    pub fn new(fetch: Arc<dyn HttpFetch>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { fetch, runner }
    }

    /// Probe every source concurrently; results come back sorted by
    /// latency, unreachable sources last.
    pub async fn test_all(&self, sources: &[SourceConfiguration]) -> Vec<SpeedResult> {
        let limit = Arc::new(Semaphore::new(MAX_IN_FLIGHT));
        let mut tasks = JoinSet::new();

        for source in sources {
            let fetch = Arc::clone(&self.fetch);
            let runner = Arc::clone(&self.runner);
            let limit = Arc::clone(&limit);
            let source = source.clone();

            tasks.spawn(async move {
                // Semaphore close is impossible here, the handle outlives the task.
                let _permit = limit.acquire().await;
                probe(&*fetch, &*runner, &source).await
            });
        }

        let mut results = Vec::with_capacity(sources.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::warn!(error = %e, "speed probe task failed"),
            }
        }

        results.sort_by_key(|r| r.latency_ms.unwrap_or(u64::MAX));
        results
    }
}

#[allow(clippy::cast_possible_truncation)]
async fn probe(
    fetch: &dyn HttpFetch,
    runner: &dyn CommandRunner,
    source: &SourceConfiguration,
) -> SpeedResult {
    let start = Instant::now();
    let head = fetch.head(&source.url, PROBE_TIMEOUT).await;
    let head_latency = start.elapsed().as_millis() as u64;

    match head {
        // Any HTTP answer proves the mirror is up; 405s from mirrors
        // that refuse HEAD still count.
        Ok(status) if status < 500 => {
            return SpeedResult {
                source_id: source.id.clone(),
                source_name: source.name.clone(),
                url: source.url.clone(),
                latency_ms: Some(head_latency),
                method: Some(ProbeMethod::Head),
                error: None,
            };
        }
        Ok(status) => {
            tracing::debug!(source = %source.id, status, "HEAD answered with a server error, falling back to ping");
        }
        Err(e) => {
            tracing::debug!(source = %source.id, error = %e, "HEAD failed, falling back to ping");
        }
    }

    let host = url::Url::parse(&source.url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string));

    let Some(host) = host else {
        return SpeedResult {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            url: source.url.clone(),
            latency_ms: None,
            method: None,
            error: Some("URL has no host to ping".into()),
        };
    };

    let options = RunOptions {
        timeout: Some(PROBE_TIMEOUT),
        ..RunOptions::default()
    };
    let args: Vec<String> = vec!["-c".into(), "1".into(), host];
    let start = Instant::now();

    match runner.run("ping", &args, &options).await {
        Ok(output) if output.success() => SpeedResult {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            url: source.url.clone(),
            latency_ms: Some(start.elapsed().as_millis() as u64),
            method: Some(ProbeMethod::Ping),
            error: None,
        },
        Ok(output) => SpeedResult {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            url: source.url.clone(),
            latency_ms: None,
            method: None,
            error: Some(format!("ping exited with {}", output.exit_code)),
        },
        Err(e) => SpeedResult {
            source_id: source.id.clone(),
            source_name: source.name.clone(),
            url: source.url.clone(),
            latency_ms: None,
            method: None,
            error: Some(e.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::FetchResponse;
    use crate::error::MirrorSwitchError;
    use crate::runner::CommandOutput;
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct MappedFetch {
        // url -> HEAD status; absent means connection error
        statuses: HashMap<String, u16>,
    }

    #[async_trait]
    impl HttpFetch for MappedFetch {
        async fn get(
            &self,
            url: &str,
            _if_none_match: Option<&str>,
            _timeout: Duration,
        ) -> Result<FetchResponse, MirrorSwitchError> {
            Err(MirrorSwitchError::network(std::io::Error::other(
                url.to_string(),
            )))
        }

        async fn head(&self, url: &str, _timeout: Duration) -> Result<u16, MirrorSwitchError> {
            self.statuses.get(url).copied().ok_or_else(|| {
                MirrorSwitchError::network(std::io::Error::other("connection refused"))
            })
        }
    }

    struct PingRunner {
        succeed: bool,
    }

    #[async_trait]
    impl CommandRunner for PingRunner {
        async fn run(
            &self,
            command: &str,
            _args: &[String],
            _options: &RunOptions,
        ) -> Result<CommandOutput, MirrorSwitchError> {
            assert_eq!(command, "ping");
            Ok(CommandOutput {
                exit_code: if self.succeed { 0 } else { 1 },
                stdout: String::new(),
                stderr: String::new(),
            })
        }
    }

    fn source(id: &str, url: &str) -> SourceConfiguration {
        SourceConfiguration {
            id: id.into(),
            name: id.into(),
            url: url.into(),
            description: None,
            region: None,
            requires_auth: false,
            auth: None,
            config_source_id: None,
            config_source_name: None,
            config_source_is_builtin: None,
        }
    }

    #[tokio::test]
    async fn head_success_is_reported_without_ping() {
        let fetch = Arc::new(MappedFetch {
            statuses: HashMap::from([("https://up.example.com/".to_string(), 200)]),
        });
        let tester = SpeedTester::new(fetch, Arc::new(PingRunner { succeed: false }));

        let results = tester.test_all(&[source("up", "https://up.example.com/")]).await;
        assert_eq!(results.len(), 1);
        assert!(results[0].reachable());
        assert_eq!(results[0].method, Some(ProbeMethod::Head));
    }

    #[tokio::test]
    async fn head_405_still_counts_as_reachable() {
        let fetch = Arc::new(MappedFetch {
            statuses: HashMap::from([("https://no-head.example.com/".to_string(), 405)]),
        });
        let tester = SpeedTester::new(fetch, Arc::new(PingRunner { succeed: false }));
        let results = tester
            .test_all(&[source("m", "https://no-head.example.com/")])
            .await;
        assert_eq!(results[0].method, Some(ProbeMethod::Head));
    }

    #[tokio::test]
    async fn failed_head_falls_back_to_ping() {
        let fetch = Arc::new(MappedFetch {
            statuses: HashMap::new(),
        });
        let tester = SpeedTester::new(fetch, Arc::new(PingRunner { succeed: true }));
        let results = tester
            .test_all(&[source("p", "https://ping-only.example.com/")])
            .await;
        assert!(results[0].reachable());
        assert_eq!(results[0].method, Some(ProbeMethod::Ping));
    }

    #[tokio::test]
    async fn unreachable_sources_sort_last_with_an_error() {
        let fetch = Arc::new(MappedFetch {
            statuses: HashMap::from([("https://up.example.com/".to_string(), 200)]),
        });
        let tester = SpeedTester::new(fetch, Arc::new(PingRunner { succeed: false }));

        let results = tester
            .test_all(&[
                source("down", "https://down.example.com/"),
                source("up", "https://up.example.com/"),
            ])
            .await;

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].source_id, "up");
        assert_eq!(results[1].source_id, "down");
        assert!(!results[1].reachable());
        assert!(results[1].error.is_some());
    }
}
