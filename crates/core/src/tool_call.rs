// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tool call record (spec §3 `RunToolCall`, §4.9 idempotency).
//!
//! Each tool call the model requests during a run is recorded before
//! execution starts, keyed by an idempotency key derived from
//! `(run_id, turn, tool_name, input)` so a retried turn never re-executes
//! a side-effecting call twice.

use serde::{Deserialize, Serialize};

/// Execution status of one tool call within a run turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
}

crate::simple_display! {
    ToolCallStatus {
        Pending => "pending",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
    }
}

/// One tool invocation requested by the model during a run turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunToolCall {
    pub run_id: crate::run::RunId,
    pub turn: u32,
    pub tool_name: String,
    pub idempotency_key: String,
    pub input: serde_json::Value,
    #[serde(default)]
    pub output: Option<serde_json::Value>,
    pub status: ToolCallStatus,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl RunToolCall {
    /// Deterministic idempotency key: stable for the same run/turn/tool/input
    /// so a re-delivered turn maps back to the same recorded call (§4.9).
    pub fn idempotency_key(
        run_id: &crate::run::RunId,
        turn: u32,
        tool_name: &str,
        input: &serde_json::Value,
    ) -> String {
        use std::hash::{Hash, Hasher};
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        input.to_string().hash(&mut hasher);
        format!("{run_id}:{turn}:{tool_name}:{:016x}", hasher.finish())
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct RunToolCallBuilder => RunToolCall {
        into {
            tool_name: String = "runCommand",
            idempotency_key: String = "key-1",
        }
        set {
            turn: u32 = 0,
            input: serde_json::Value = serde_json::json!({}),
            status: ToolCallStatus = ToolCallStatus::Pending,
        }
        option {
            output: serde_json::Value = None,
            error_message: String = None,
            duration_ms: u64 = None,
        }
        computed { run_id: crate::run::RunId = crate::run::RunId::new() }
    }
}

#[cfg(test)]
#[path = "tool_call_tests.rs"]
mod tests;
