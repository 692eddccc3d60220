// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Closed error taxonomy shared by every component.
//!
//! Each subsystem (gateway, container driver, queue, build pipeline, ...)
//! raises one of these kinds; nothing downstream needs to know which
//! subsystem produced it, only how to react (HTTP status, retry, log).

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Domain-level error kind (spec §7). Carries a short user-facing message;
/// never the underlying `std::error::Error` (that's logged, not surfaced).
#[derive(Debug, Clone, thiserror::Error, Serialize, Deserialize)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("rate limited")]
    RateLimited,

    #[error("command not allowed: {0}")]
    NotAllowed(String),

    #[error("disallowed pattern: {0}")]
    DisallowedPattern(String),

    #[error("invalid argument to command: {0}")]
    InvalidArg(String),

    #[error("path escapes sandbox workdir: {0}")]
    PathEscape(String),

    #[error("command failed: {0}")]
    CommandFailed(String),

    #[error("build failed: {0}")]
    BuildFailed(String),

    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    #[error("llm failure: {0}")]
    LlmFailure(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// HTTP status a transport layer should map this to. The mapping itself
    /// lives here so every caller agrees on it; the transport is out of scope.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::InvalidArgument(_)
            | Error::InvalidArg(_)
            | Error::DisallowedPattern(_)
            | Error::PathEscape(_) => 400,
            Error::Unauthorized => 401,
            Error::Forbidden => 403,
            Error::NotFound(_) => 404,
            Error::Conflict(_) => 409,
            Error::RateLimited => 429,
            Error::NotAllowed(_) | Error::CommandFailed(_) | Error::BuildFailed(_) => 422,
            Error::StorageUnavailable(_) | Error::RegistryUnavailable(_) => 503,
            Error::LlmFailure(_) | Error::Internal(_) => 500,
        }
    }

    /// Whether this error class is safe to retry (queue/backoff policy, §7).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_) | Error::RegistryUnavailable(_))
    }
}

/// User-visible error envelope: short message plus an ISO timestamp (spec §7).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn from_error(err: &Error, now: SystemTime) -> Self {
        Self { message: err.to_string(), timestamp: crate::time_fmt::to_rfc3339(now) }
    }
}

/// Classifies an upstream transport error as retryable per spec §7's list of
/// network-class error conditions (5xx, connection resets, timeouts, throttling).
pub fn is_retryable_transport_error(message: &str) -> bool {
    const RETRYABLE_MARKERS: &[&str] = &[
        "ECONNRESET",
        "ENOTFOUND",
        "ECONNREFUSED",
        "timed out",
        "timeout",
        "throttl",
        "slowdown",
        "503",
        "502",
        "500",
        "504",
    ];
    RETRYABLE_MARKERS.iter().any(|m| message.contains(m))
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
