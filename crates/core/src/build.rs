// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Build identifier and record (spec §3 `Build`, §4.12 build pipeline).

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a preview build.
    pub struct BuildId("bld-");
}

/// Lifecycle status of a preview build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStatus {
    Queued,
    Building,
    Success,
    Failed,
}

crate::simple_display! {
    BuildStatus {
        Queued => "queued",
        Building => "building",
        Success => "success",
        Failed => "failed",
    }
}

impl BuildStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, BuildStatus::Success | BuildStatus::Failed)
    }
}

/// A build's materialized record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Build {
    pub id: BuildId,
    pub sandbox_id: crate::sandbox::SandboxId,
    pub chat_id: crate::sandbox::ChatId,
    pub message_id: String,
    pub status: BuildStatus,
    #[serde(default)]
    pub error_log: Option<String>,
    #[serde(default)]
    pub preview_url: Option<String>,
    #[serde(default)]
    pub build_duration_ms: Option<u64>,
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct BuildBuilder => Build {
        into {
            chat_id: crate::sandbox::ChatId = crate::sandbox::ChatId::new("chat-1"),
            message_id: String = "msg-1",
        }
        set { status: BuildStatus = BuildStatus::Queued }
        option {
            error_log: String = None,
            preview_url: String = None,
            build_duration_ms: u64 = None,
        }
        computed {
            id: BuildId = BuildId::new(),
            sandbox_id: crate::sandbox::SandboxId = crate::sandbox::SandboxId::new(),
        }
    }
}

#[cfg(test)]
#[path = "build_tests.rs"]
mod tests;
