//! External tool invocation.

use crate::bundler::error::{Error, Result};
use std::process::Output;
use tokio::process::Command;

/// Runs a prepared command to completion and captures its output.
///
/// Standard output and standard error are logged at debug level. A non-zero
/// exit becomes [`Error::ToolFailed`] carrying the captured standard error.
pub async fn run(command: &mut Command) -> Result<Output> {
    let program = command.as_std().get_program().to_string_lossy().into_owned();
    let line = describe(command);
    log::debug!("Running {line}");

    let output = command.output().await.map_err(|error| Error::CommandFailed {
        command: program.clone(),
        error,
    })?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stdout.trim().is_empty() {
        log::debug!("{program} stdout:\n{}", stdout.trim_end());
    }
    if !stderr.trim().is_empty() {
        log::debug!("{program} stderr:\n{}", stderr.trim_end());
    }

    if !output.status.success() {
        return Err(Error::ToolFailed {
            tool: program,
            status: output.status.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }
    Ok(output)
}

/// Like [`run`], returning standard output as text.
pub async fn run_capture(command: &mut Command) -> Result<String> {
    let output = run(command).await?;
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn describe(command: &Command) -> String {
    let std = command.as_std();
    let mut line = std.get_program().to_string_lossy().into_owned();
    for arg in std.get_args() {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}
