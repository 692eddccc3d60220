// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution: runs one already-validated argv through the gateway,
//! enforcing the wall-clock timeout and per-stream truncation limits (spec
//! §4.5). Truncation idiom and trace shape are grounded on the teacher's
//! shell executor (`CommandTrace`/`ExecOutput`, `truncate_snippet`), trimmed
//! down from "every command in an AST" to "one already-allow-listed argv".

use crate::allowlist;
use edw_core::Error;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::time::timeout;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
const CAT_STDOUT_LIMIT: usize = 512 * 1024;
const DEFAULT_STDOUT_LIMIT: usize = 1024 * 1024;
const TRUNCATION_MARKER: &str = "\n...[truncated]";

/// Outcome of running one gateway-validated command.
#[derive(Debug)]
pub struct ExecOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

/// Runs `command argv` inside `workdir`, after validating it against the
/// allow-list. Does not itself decide `throwOnError`; callers that need
/// `CommandFailed` on non-zero exit check `exit_code` themselves.
pub async fn exec(command: &str, args: &[String], workdir: &Path) -> Result<ExecOutput, Error> {
    allowlist::validate(command, args, workdir)?;

    let stdout_limit = if command == "cat" { CAT_STDOUT_LIMIT } else { DEFAULT_STDOUT_LIMIT };

    let mut child = Command::new(command)
        .args(args)
        .current_dir(workdir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| Error::CommandFailed(format!("failed to spawn {command}: {e}")))?;

    let mut stdout_pipe = child.stdout.take().expect("piped stdout");
    let mut stderr_pipe = child.stderr.take().expect("piped stderr");

    let started = Instant::now();
    let run = async {
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();
        let (stdout_result, stderr_result, status) = tokio::join!(
            stdout_pipe.read_to_end(&mut stdout_buf),
            stderr_pipe.read_to_end(&mut stderr_buf),
            child.wait(),
        );
        stdout_result.map_err(|e| Error::CommandFailed(e.to_string()))?;
        stderr_result.map_err(|e| Error::CommandFailed(e.to_string()))?;
        let status = status.map_err(|e| Error::CommandFailed(e.to_string()))?;
        Ok::<_, Error>((stdout_buf, stderr_buf, status))
    };

    let (stdout_buf, stderr_buf, status) = match timeout(DEFAULT_TIMEOUT, run).await {
        Ok(result) => result?,
        Err(_) => {
            let _ = child.start_kill();
            return Err(Error::CommandFailed(format!("{command} timed out after {DEFAULT_TIMEOUT:?}")));
        }
    };

    Ok(ExecOutput {
        exit_code: status.code().unwrap_or(-1),
        stdout: truncate(&stdout_buf, stdout_limit),
        stderr: truncate(&stderr_buf, DEFAULT_STDOUT_LIMIT),
        duration: started.elapsed(),
    })
}

fn truncate(bytes: &[u8], limit: usize) -> String {
    let s = String::from_utf8_lossy(bytes);
    if s.len() <= limit {
        return s.into_owned();
    }
    let mut end = limit.min(s.len());
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{TRUNCATION_MARKER}", &s[..end])
}

#[cfg(test)]
#[path = "exec_tests.rs"]
mod tests;
