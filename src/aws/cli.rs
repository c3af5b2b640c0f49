//! AWS CLI command execution.
//!
//! Runs the CLI as a blocking subprocess and returns its stdout.

use crate::error::{AllocError, Result};
use colored::Colorize;
use std::process::Command;

/// Run `program args..` and return its stdout.
///
/// # Arguments
/// * `program` - The CLI binary, e.g. `aws`
/// * `args` - Arguments, passed through without shell interpretation
/// * `max_output` - Upper bound on accepted stdout size in bytes
///
/// # Returns
/// * `Ok(String)` - The stdout output on success
/// * `Err` - If the command cannot start, exits nonzero or produces too much output
pub fn run(program: &str, args: &[String], max_output: usize) -> Result<String> {
    let cmd = display_command(program, args);
    log::debug!("run({cmd})", cmd = cmd.on_blue());

    let output = Command::new(program).args(args).output().map_err(|e| {
        log::error!("Command execution failed: {}", e);
        AllocError::external("command", format!("failed to execute {program}: {e}"))
    })?;

    if output.status.success() {
        log::debug!("Success cmd: {cmd}");
        log::debug!("Success output.stdout.len(): {}", output.stdout.len());

        if output.stdout.len() > max_output {
            return Err(AllocError::external(
                "command",
                format!(
                    "response too large: {} bytes for command: {cmd}",
                    output.stdout.len()
                ),
            ));
        }
    } else {
        let stderr = String::from_utf8_lossy(&output.stderr);
        log::trace!(
            "code={code:?}, status={status}\n┎######\nstderr=\n{stderr}\n┖######",
            code = output.status.code(),
            status = output.status,
            stderr = stderr.red()
        );
        log::warn!(
            "{failed} to run {cmd}",
            failed = "failed".on_red(),
            cmd = cmd.on_blue()
        );
        return Err(AllocError::external("command", stderr.trim().to_string()));
    }

    String::from_utf8(output.stdout)
        .map_err(|e| AllocError::external("command", format!("invalid UTF-8 in output: {e}")))
}

/// Render a command line for logs, quoting arguments that contain spaces.
fn display_command(program: &str, args: &[String]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|arg| {
        if arg.is_empty() || arg.contains(char::is_whitespace) {
            format!("'{arg}'")
        } else {
            arg.clone()
        }
    }));
    parts.join(" ")
}
