// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background job identifier and payload (spec §3 `Job`, §4.11 worker pool).
//!
//! Unlike the other entity IDs in this crate, [`JobId`] is not randomly
//! generated: it is deterministic from the job's kind and sandbox, so
//! enqueuing the same logical job twice (e.g. two reconciliation passes both
//! deciding a sandbox needs a backup) collapses to one queue entry instead of
//! duplicating work.

use serde::{Deserialize, Serialize};

use crate::sandbox::{ChatId, SandboxId, UserId};

/// Deterministic job queue identifier: `{kind}:{sandbox_id}:{suffix}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

impl JobId {
    pub fn new(kind: &str, sandbox_id: &SandboxId, suffix: &str) -> Self {
        Self(format!("{kind}:{sandbox_id}:{suffix}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Why a backup or cleanup job was enqueued, carried through to logging and
/// job-history inspection (§4.11, §4.14).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobReason {
    Scheduled,
    Reconciliation,
    UserRequested,
    SandboxExpiring,
}

crate::simple_display! {
    JobReason {
        Scheduled => "scheduled",
        Reconciliation => "reconciliation",
        UserRequested => "user_requested",
        SandboxExpiring => "sandbox_expiring",
    }
}

/// The work a queued job carries out. One worker pool (§4.11) drains all
/// three kinds; each handler dispatches on this tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobPayload {
    Build {
        sandbox_id: SandboxId,
        user_id: UserId,
        chat_id: ChatId,
        message_id: String,
        run_id: crate::run::RunId,
        build_id: crate::build::BuildId,
    },
    Backup {
        sandbox_id: SandboxId,
        user_id: UserId,
        chat_id: ChatId,
        reason: JobReason,
    },
    Cleanup {
        sandbox_id: SandboxId,
        user_id: UserId,
        reason: JobReason,
    },
}

impl JobPayload {
    pub fn kind(&self) -> &'static str {
        match self {
            JobPayload::Build { .. } => "build",
            JobPayload::Backup { .. } => "backup",
            JobPayload::Cleanup { .. } => "cleanup",
        }
    }

    pub fn sandbox_id(&self) -> &SandboxId {
        match self {
            JobPayload::Build { sandbox_id, .. }
            | JobPayload::Backup { sandbox_id, .. }
            | JobPayload::Cleanup { sandbox_id, .. } => sandbox_id,
        }
    }

    /// The deterministic queue key for this payload (§4.11 dedup).
    pub fn job_id(&self, suffix: &str) -> JobId {
        JobId::new(self.kind(), self.sandbox_id(), suffix)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
