//! Plugin entry point execution via subprocess
//!
//! The entry point is run with a command argument (`describe` or
//! `build <adapter>`) and must print a single JSON document on stdout.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tokio::time::timeout;

use crate::{Error, Result};

/// Default timeout for a single entry point invocation
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Run an entry point and parse its stdout as JSON
///
/// # Errors
///
/// Returns `Error::LoadExecution` if the process cannot be spawned, times
/// out, exits non-zero or prints something other than JSON
pub async fn run_entry_point(
    entry: &Path,
    args: &[&str],
    run_timeout: Duration,
) -> Result<serde_json::Value> {
    let fail = |reason: String| Error::LoadExecution {
        path: entry.to_path_buf(),
        reason,
    };

    // Determine how to run the entry point
    let (program, mut program_args) = determine_executor(entry).map_err(fail)?;
    program_args.extend(args.iter().map(ToString::to_string));

    // Spawn process
    let child = Command::new(&program)
        .args(&program_args)
        .current_dir(entry.parent().unwrap_or_else(|| Path::new(".")))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| fail(format!("failed to spawn {program}: {e}")))?;

    // Wait for completion with timeout
    let output = timeout(run_timeout, child.wait_with_output())
        .await
        .map_err(|_| fail(format!("timed out after {run_timeout:?}")))?
        .map_err(|e| fail(format!("execution failed: {e}")))?;

    if !output.stderr.is_empty() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(entry = %entry.display(), stderr = %stderr, "entry point stderr");
    }

    // Surface the last stderr line on failure
    if !output.status.success() {
        let code = output.status.code().unwrap_or(-1);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let detail = stderr.lines().next_back().unwrap_or_default().trim().to_string();
        return Err(fail(if detail.is_empty() {
            format!("exited with code {code}")
        } else {
            format!("exited with code {code}: {detail}")
        }));
    }

    // Stdout must be a single JSON document
    let stdout = String::from_utf8_lossy(&output.stdout);
    serde_json::from_str(stdout.trim()).map_err(|e| fail(format!("invalid JSON output: {e}")))
}

/// Determine how to run the entry point based on its extension
fn determine_executor(entry: &Path) -> std::result::Result<(String, Vec<String>), String> {
    let extension = entry
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("");

    let path_str = entry
        .to_str()
        .ok_or_else(|| "entry point path is not valid UTF-8".to_string())?
        .to_string();

    match extension {
        "js" | "mjs" | "cjs" => Ok(("node".to_string(), vec![path_str])),
        "py" => Ok(("python3".to_string(), vec![path_str])),
        "ts" => Ok(("bun".to_string(), vec!["run".to_string(), path_str])),
        "sh" => Ok(("bash".to_string(), vec![path_str])),
        "" => Ok((path_str, vec![])),
        _ => Err(format!("unknown entry point extension: .{extension}")),
    }
}
