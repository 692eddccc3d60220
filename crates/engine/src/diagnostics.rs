// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build/type error diagnostics (C18): regex-based extraction of
//! structured errors out of a build pipeline's raw stderr/stdout tail
//! (`BuildOutcome::error_log`), the same `regex`-driven text-mining idiom
//! `agent_loop.rs`'s `extract_title`/`strip_tags` use on scraped HTML.

use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub column: Option<u32>,
    pub message: String,
}

/// Extracts structured diagnostics from `log`, trying the most specific
/// known format first and falling back to a generic line scan. Returns an
/// empty vec (not an error) when nothing recognizable is found — the raw
/// log is always still available to show verbatim.
pub fn extract_diagnostics(log: &str) -> Vec<Diagnostic> {
    let tsc = extract_tsc(log);
    if !tsc.is_empty() {
        return tsc;
    }

    let eslint = extract_eslint(log);
    if !eslint.is_empty() {
        return eslint;
    }

    extract_generic(log)
}

fn parse_severity(s: &str) -> Severity {
    if s.eq_ignore_ascii_case("warning") {
        Severity::Warning
    } else {
        Severity::Error
    }
}

/// tsc: `src/app.ts(12,5): error TS2322: Type 'string' is not assignable...`
fn extract_tsc(log: &str) -> Vec<Diagnostic> {
    let re = match Regex::new(r"(?m)^(?P<file>[^\s():]+)\((?P<line>\d+),(?P<column>\d+)\): (?P<severity>error|warning) TS\d+: (?P<message>.+)$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    re.captures_iter(log)
        .map(|c| Diagnostic {
            severity: parse_severity(&c["severity"]),
            file: Some(c["file"].to_string()),
            line: c.name("line").and_then(|m| m.as_str().parse().ok()),
            column: c.name("column").and_then(|m| m.as_str().parse().ok()),
            message: c["message"].trim().to_string(),
        })
        .collect()
}

/// eslint/webpack-style: `./src/App.tsx` followed on a later line by
/// `  10:5  error  'foo' is not defined  no-undef`.
fn extract_eslint(log: &str) -> Vec<Diagnostic> {
    let file_header = match Regex::new(r"(?m)^\./(?P<file>\S+)$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    let entry = match Regex::new(r"(?m)^\s*(?P<line>\d+):(?P<column>\d+)\s+(?P<severity>error|warning)\s+(?P<message>.+?)(?:\s{2,}\S+)?$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };

    let mut diagnostics = Vec::new();
    let mut current_file: Option<String> = None;
    for line in log.lines() {
        if let Some(c) = file_header.captures(line) {
            current_file = Some(c["file"].to_string());
            continue;
        }
        if let Some(c) = entry.captures(line) {
            diagnostics.push(Diagnostic {
                severity: parse_severity(&c["severity"]),
                file: current_file.clone(),
                line: c.name("line").and_then(|m| m.as_str().parse().ok()),
                column: c.name("column").and_then(|m| m.as_str().parse().ok()),
                message: c["message"].trim().to_string(),
            });
        }
    }
    diagnostics
}

/// Fallback for build tool output this module has no dedicated parser
/// for: any line that starts with `error`.
fn extract_generic(log: &str) -> Vec<Diagnostic> {
    let re = match Regex::new(r"(?mi)^\s*error:?\s+(?P<message>.+)$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    re.captures_iter(log)
        .map(|c| Diagnostic { severity: Severity::Error, file: None, line: None, column: None, message: c["message"].trim().to_string() })
        .collect()
}

#[cfg(test)]
#[path = "diagnostics_tests.rs"]
mod tests;
