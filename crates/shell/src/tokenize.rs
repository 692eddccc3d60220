// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Argv tokenizer for the command gateway (C6). The agent never gets a
//! shell: a tool call names one command and its literal arguments, so this
//! is quote-stripping only — no pipelines, redirection syntax, globbing, or
//! variable expansion. Anything resembling shell metacharacters is treated
//! as a literal argument byte, not a feature.

use edw_core::Error;

/// Splits a command line into argv, honoring single and double quotes.
/// Unterminated quotes are an `InvalidArg` error rather than a best-effort
/// guess at the author's intent.
pub fn tokenize(line: &str) -> Result<Vec<String>, Error> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut current_started = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            ' ' | '\t' | '\n' => {
                if current_started {
                    tokens.push(std::mem::take(&mut current));
                    current_started = false;
                }
            }
            '\'' => {
                current_started = true;
                let mut closed = false;
                for next in chars.by_ref() {
                    if next == '\'' {
                        closed = true;
                        break;
                    }
                    current.push(next);
                }
                if !closed {
                    return Err(Error::InvalidArg("unterminated single quote".into()));
                }
            }
            '"' => {
                current_started = true;
                let mut closed = false;
                while let Some(next) = chars.next() {
                    match next {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' if matches!(chars.peek(), Some('"') | Some('\\')) => {
                            current.push(chars.next().unwrap());
                        }
                        other => current.push(other),
                    }
                }
                if !closed {
                    return Err(Error::InvalidArg("unterminated double quote".into()));
                }
            }
            other => {
                current_started = true;
                current.push(other);
            }
        }
    }
    if current_started {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
#[path = "tokenize_tests.rs"]
mod tests;
