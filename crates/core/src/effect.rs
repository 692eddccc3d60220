// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Side-effect requests emitted by the agent loop (§4.9) and reconciliation
//! loop (§4.14), decoupled from whichever adapter actually executes them.
//!
//! The engine crate's runtime interprets these against trait objects
//! (`ContainerDriver`, `KvStore`, queue producer); tests interpret them
//! against fakes and assert on the emitted list directly, without needing a
//! real container or Redis.

use serde::{Deserialize, Serialize};

use crate::job::JobPayload;
use crate::sandbox::{ChatId, SandboxId, UserId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Record a domain event (audit log / run event log, depending on scope).
    Emit { event: crate::event::Event },

    /// Start a container for a chat that has none yet (§4.3).
    ProvisionSandbox { user_id: UserId, chat_id: ChatId },

    /// Tear down a sandbox's container and release its lock (§4.14).
    DestroySandbox { sandbox_id: SandboxId, reason: String },

    /// Run one command inside a sandbox's container (§4.5 gateway).
    ExecInSandbox { sandbox_id: SandboxId, argv: Vec<String> },

    /// Hand work to the background worker pool (§4.11).
    EnqueueJob { payload: JobPayload },

    /// Append one entry to a run's event stream (§4.10).
    AppendRunEvent { run_id: crate::run::RunId, event_type: String, payload: serde_json::Value },

    /// Push a build status transition toward subscribers (§4.13).
    PublishBuildStatus { chat_id: ChatId, build_id: crate::build::BuildId, status: crate::build::BuildStatus },
}

impl Effect {
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::Emit { .. } => "emit",
            Effect::ProvisionSandbox { .. } => "provision_sandbox",
            Effect::DestroySandbox { .. } => "destroy_sandbox",
            Effect::ExecInSandbox { .. } => "exec_in_sandbox",
            Effect::EnqueueJob { .. } => "enqueue_job",
            Effect::AppendRunEvent { .. } => "append_run_event",
            Effect::PublishBuildStatus { .. } => "publish_build_status",
        }
    }
}

#[cfg(test)]
#[path = "effect_tests.rs"]
mod tests;
