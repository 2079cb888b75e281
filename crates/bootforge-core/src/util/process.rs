//! Process execution utilities.
//!
//! Everything here is synchronous and blocking; the callers (triggers,
//! service reloads, power commands) are specified that way.

use bootforge_types::Result;
use std::collections::HashMap;
use std::process::Command;
use std::time::Duration;
use tracing::{debug, warn};

/// Execute a command synchronously.
///
/// Returns `(stdout, exit_code, stderr)`.
pub fn run(command: &str, args: &[&str]) -> Result<(String, i32, String)> {
    debug!("running {} {:?}", command, args);
    let output = Command::new(command).args(args).output()?;

    Ok((
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stderr).to_string(),
    ))
}

/// Execute a command with environment variables.
pub fn run_with_env(
    command: &str,
    args: &[&str],
    env_vars: &HashMap<String, String>,
) -> Result<(String, i32, String)> {
    let mut cmd = Command::new(command);
    cmd.args(args);

    for (key, value) in env_vars {
        cmd.env(key, value);
    }

    let output = cmd.output()?;

    Ok((
        String::from_utf8_lossy(&output.stdout).to_string(),
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stderr).to_string(),
    ))
}

/// Execute a command up to `tries` times with a fixed sleep between
/// attempts, stopping at the first zero exit.
///
/// Some managed hardware (power switches in particular) is flaky; a small
/// fixed retry budget is the contract, never an unbounded backoff.
pub fn run_with_retries(
    command: &str,
    args: &[&str],
    tries: u32,
    delay: Duration,
) -> Result<(String, i32, String)> {
    let tries = tries.max(1);
    let mut last = run(command, args)?;
    for attempt in 1..tries {
        if last.1 == 0 {
            return Ok(last);
        }
        warn!(
            "{} exited {} (attempt {}/{}), retrying",
            command, last.1, attempt, tries
        );
        std::thread::sleep(delay);
        last = run(command, args)?;
    }
    Ok(last)
}
