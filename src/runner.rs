//! Black-box subprocess execution.
//!
//! [`CommandRunner`] is the seam between strategy logic and the
//! operating system: `run(command, args)` yields exit code, stdout and
//! stderr, nothing more. The production implementation shells out via
//! `tokio::process`; tests substitute a fake.

use std::collections::HashMap;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::MirrorSwitchError;

/// Default ceiling on a single subprocess. Package-manager CLIs that
/// take longer than this are considered wedged.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub environment: HashMap<String, String>,
    pub working_directory: Option<String>,
    pub timeout: Option<Duration>,
}

#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(
        &self,
        command: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandOutput, MirrorSwitchError>;
}

/// Production runner backed by `tokio::process::Command`.
#[derive(Debug, Default)]
pub struct TokioRunner;

#[async_trait]
impl CommandRunner for TokioRunner {
    async fn run(
        &self,
        command: &str,
        args: &[String],
        options: &RunOptions,
    ) -> Result<CommandOutput, MirrorSwitchError> {
        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            // A timeout drops the output future; the child must die
            // with it rather than keep running unsupervised.
            .kill_on_drop(true);

        for (key, value) in &options.environment {
            cmd.env(key, value);
        }
        if let Some(ref dir) = options.working_directory {
            cmd.current_dir(dir);
        }

        let timeout = options.timeout.unwrap_or(DEFAULT_COMMAND_TIMEOUT);

        let spawned = cmd.output();
        let output = match tokio::time::timeout(timeout, spawned).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MirrorSwitchError::ExecutableNotFound {
                    command: command.to_string(),
                });
            }
            Ok(Err(e)) => return Err(MirrorSwitchError::Io(e)),
            Err(_) => {
                return Err(MirrorSwitchError::CommandExecutionFailed {
                    stderr: format!("'{command}' timed out after {}s", timeout.as_secs()),
                    exit_code: None,
                });
            }
        };

        Ok(CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn captures_stdout_and_exit_code() {
        let runner = TokioRunner;
        let output = runner
            .run("echo", &["hello".into()], &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(output.exit_code, 0);
        assert_eq!(output.stdout.trim(), "hello");
        assert!(output.success());
    }

    #[tokio::test]
    async fn missing_executable_maps_to_executable_not_found() {
        let runner = TokioRunner;
        let err = runner
            .run(
                "definitely-not-a-real-binary-zzz",
                &[],
                &RunOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MirrorSwitchError::ExecutableNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn nonzero_exit_is_reported_not_errored() {
        let runner = TokioRunner;
        let output = runner
            .run("sh", &["-c".into(), "exit 3".into()], &RunOptions::default())
            .await
            .unwrap();
        assert_eq!(output.exit_code, 3);
        assert!(!output.success());
    }

    #[tokio::test]
    async fn timed_out_command_errors_and_child_is_killed() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("marker");

        let runner = TokioRunner;
        let options = RunOptions {
            timeout: Some(Duration::from_millis(200)),
            ..RunOptions::default()
        };
        let err = runner
            .run(
                "sh",
                &[
                    "-c".into(),
                    format!("sleep 1; touch {}", marker.display()),
                ],
                &options,
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MirrorSwitchError::CommandExecutionFailed { .. }
        ));

        // The shell was killed on timeout, so the marker never appears.
        tokio::time::sleep(Duration::from_millis(1200)).await;
        assert!(!marker.exists());
    }

    #[tokio::test]
    async fn environment_is_passed_through() {
        let runner = TokioRunner;
        let mut options = RunOptions::default();
        options
            .environment
            .insert("MIRRORSWITCH_TEST_VAR".into(), "42".into());
        let output = runner
            .run(
                "sh",
                &["-c".into(), "printf %s \"$MIRRORSWITCH_TEST_VAR\"".into()],
                &options,
            )
            .await
            .unwrap();
        assert_eq!(output.stdout, "42");
    }
}
