// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain event enum logged by the daemon for observability and by the run
//! event log (storage crate, §4.10) for anything scoped to a single run.
//!
//! These are distinct from [`crate::effect::Effect`]: an `Event` records that
//! something happened, an `Effect` requests that something happen.

use serde::{Deserialize, Serialize};

use crate::build::BuildStatus;
use crate::job::JobId;
use crate::run::RunStatus;
use crate::sandbox::{ChatId, SandboxId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    SandboxProvisioned { sandbox_id: SandboxId, user_id: UserId, chat_id: ChatId },
    SandboxExpired { sandbox_id: SandboxId },
    SandboxDestroyed { sandbox_id: SandboxId, reason: String },
    RunCreated { run_id: crate::run::RunId, chat_id: ChatId, user_id: UserId },
    RunStatusChanged { run_id: crate::run::RunId, status: RunStatus },
    JobEnqueued { job_id: JobId, kind: String, sandbox_id: SandboxId },
    JobCompleted { job_id: JobId },
    JobFailed { job_id: JobId, attempt: u32, error: String },
    BuildStatusChanged { build_id: crate::build::BuildId, chat_id: ChatId, status: BuildStatus },
}

impl Event {
    /// A short, loggable one-liner — the teacher's `log_summary` idiom.
    pub fn log_summary(&self) -> String {
        match self {
            Event::SandboxProvisioned { sandbox_id, chat_id, .. } => {
                format!("sandbox {sandbox_id} provisioned for chat {chat_id}")
            }
            Event::SandboxExpired { sandbox_id } => format!("sandbox {sandbox_id} expired"),
            Event::SandboxDestroyed { sandbox_id, reason } => {
                format!("sandbox {sandbox_id} destroyed: {reason}")
            }
            Event::RunCreated { run_id, chat_id, .. } => {
                format!("run {run_id} created for chat {chat_id}")
            }
            Event::RunStatusChanged { run_id, status } => {
                format!("run {run_id} -> {status}")
            }
            Event::JobEnqueued { job_id, kind, .. } => format!("job {job_id} enqueued ({kind})"),
            Event::JobCompleted { job_id } => format!("job {job_id} completed"),
            Event::JobFailed { job_id, attempt, error } => {
                format!("job {job_id} failed on attempt {attempt}: {error}")
            }
            Event::BuildStatusChanged { build_id, status, .. } => {
                format!("build {build_id} -> {status}")
            }
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
