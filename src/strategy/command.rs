//! Command strategy: the tool's own CLI performs the switch.
//!
//! `set` optionally runs a chain of precursor commands whose parsed
//! output is captured into the template context, then resolves the
//! argument templates and invokes the real command. A non-zero exit is
//! a hard failure carrying stderr.

use std::collections::HashMap;
use std::time::Duration;

use crate::config::model::{CommandGet, CommandSet, SourceConfiguration};
use crate::error::MirrorSwitchError;
use crate::runner::{CommandRunner, RunOptions};
use crate::template;

use super::parser;

pub async fn set_value(
    runner: &dyn CommandRunner,
    set: &CommandSet,
    source: &SourceConfiguration,
) -> Result<(), MirrorSwitchError> {
    let mut context: HashMap<String, String> = HashMap::new();

    for pre in &set.pre_commands {
        let variables = template::extract_variables(source, &context);
        let args = template::resolve_all(&pre.arguments, &variables)?;

        let output = runner.run(&pre.command, &args, &RunOptions::default()).await?;
        if !output.success() {
            return Err(MirrorSwitchError::CommandExecutionFailed {
                stderr: output.stderr,
                exit_code: Some(output.exit_code),
            });
        }

        let captured = parser::apply(pre.output_parser, pre.parser_pattern.as_deref(), &output.stdout)?;
        tracing::debug!(capture_as = %pre.capture_as, value = %captured, "captured precursor output");
        context.insert(pre.capture_as.clone(), captured);
    }

    let variables = template::extract_variables(source, &context);
    let args = template::resolve_all(&set.arguments, &variables)?;

    if set.requires_admin {
        tracing::warn!(command = %set.command, "strategy requests elevation; running without it");
    }

    let options = RunOptions {
        environment: set.environment.clone(),
        working_directory: set.working_directory.clone(),
        timeout: set.timeout.map(Duration::from_secs),
    };

    let output = runner.run(&set.command, &args, &options).await?;
    if !output.success() {
        return Err(MirrorSwitchError::CommandExecutionFailed {
            stderr: output.stderr,
            exit_code: Some(output.exit_code),
        });
    }

    Ok(())
}

pub async fn get_value(
    runner: &dyn CommandRunner,
    get: &CommandGet,
) -> Result<String, MirrorSwitchError> {
    let options = RunOptions {
        timeout: get.timeout.map(Duration::from_secs),
        ..RunOptions::default()
    };

    let output = runner.run(&get.command, &get.arguments, &options).await?;
    if !output.success() {
        return Err(MirrorSwitchError::CommandExecutionFailed {
            stderr: output.stderr,
            exit_code: Some(output.exit_code),
        });
    }

    parser::apply(get.output_parser, get.parser_pattern.as_deref(), &output.stdout)
}
