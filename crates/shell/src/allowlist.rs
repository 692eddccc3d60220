// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command gateway allow-list and argument validation (C6, spec §4.5).
//! Enforced before every `exec` the agent loop dispatches into a sandbox.

use edw_core::Error;
use std::path::{Component, Path, PathBuf};

pub const ALLOWED_COMMANDS: &[&str] =
    &["ls", "find", "grep", "mv", "cp", "mkdir", "rm", "cat", "pnpm", "npm", "git", "pwd", "date", "echo", "touch", "head", "tail", "wc", "tsc"];

const MAX_ARG_COUNT: usize = 60;
const MAX_ARG_LEN: usize = 1024;
const MAX_TOTAL_ARG_LEN: usize = 8192;

const DISALLOWED_PATTERNS: &[&str] = &["rm -rf /", "chmod", "chown"];

/// Validates `command argv` against the allow-list and every spec §4.5
/// rule. `workdir` is the sandbox-relative directory the agent is confined
/// to; path-like arguments must resolve within it.
pub fn validate(command: &str, args: &[String], workdir: &Path) -> Result<(), Error> {
    if !ALLOWED_COMMANDS.contains(&command) {
        return Err(Error::NotAllowed(command.to_string()));
    }

    let joined = std::iter::once(command).chain(args.iter().map(String::as_str)).collect::<Vec<_>>().join(" ");
    for pattern in DISALLOWED_PATTERNS {
        if joined.contains(pattern) {
            return Err(Error::DisallowedPattern(pattern.to_string()));
        }
    }
    if contains_redirection_into_etc(&joined) {
        return Err(Error::DisallowedPattern("redirection into /etc/".to_string()));
    }

    if command == "find" && args.iter().any(|a| matches!(a.as_str(), "-exec" | "-execdir" | "-ok" | "-okdir")) {
        return Err(Error::DisallowedPattern("find -exec family is rejected".to_string()));
    }

    validate_arg_shape(args)?;

    for (i, arg) in args.iter().enumerate() {
        if looks_path_like(arg) {
            validate_path_confinement(command, arg, workdir)?;
        } else if let Some(value) = arg.strip_prefix("-k=") {
            if looks_path_like(value) {
                validate_path_confinement(command, value, workdir)?;
            }
            let _ = i;
        }
    }

    Ok(())
}

fn contains_redirection_into_etc(joined: &str) -> bool {
    joined.contains('>') && joined.contains("/etc/")
}

fn validate_arg_shape(args: &[String]) -> Result<(), Error> {
    if args.len() > MAX_ARG_COUNT {
        return Err(Error::InvalidArg(format!("too many arguments: {}", args.len())));
    }
    let mut total = 0usize;
    for arg in args {
        if arg.len() > MAX_ARG_LEN {
            return Err(Error::InvalidArg(format!("argument exceeds {MAX_ARG_LEN} chars")));
        }
        if arg.chars().any(|c| (c as u32) < 0x20 || c as u32 == 0x7f) {
            return Err(Error::InvalidArg("argument contains a control character".to_string()));
        }
        total += arg.len();
    }
    if total > MAX_TOTAL_ARG_LEN {
        return Err(Error::InvalidArg(format!("total argument length exceeds {MAX_TOTAL_ARG_LEN} chars")));
    }
    Ok(())
}

fn looks_path_like(arg: &str) -> bool {
    arg == "."
        || arg == ".."
        || arg.starts_with('/')
        || arg.starts_with("./")
        || arg.starts_with("../")
        || arg.contains('/')
}

/// Resolves `arg` against `workdir` and rejects anything that escapes it.
/// `rm` against the workdir root itself is rejected outright.
fn validate_path_confinement(command: &str, arg: &str, workdir: &Path) -> Result<(), Error> {
    let candidate = if Path::new(arg).is_absolute() { PathBuf::from(arg) } else { workdir.join(arg) };
    let normalized = normalize(&candidate);
    let normalized_workdir = normalize(workdir);

    if command == "rm" && normalized == normalized_workdir {
        return Err(Error::PathEscape("refusing to rm the workdir root".to_string()));
    }
    if !normalized.starts_with(&normalized_workdir) {
        return Err(Error::PathEscape(format!("{arg} escapes the sandbox workdir")));
    }
    Ok(())
}

/// Lexical normalization (no filesystem access): resolves `.`/`..`
/// components without following symlinks.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
#[path = "allowlist_tests.rs"]
mod tests;
