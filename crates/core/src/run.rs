// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run identifier and state machine (spec §3 `Run`, §4.9 agent loop).
//!
//! A run is one LLM-driven agent loop over a sandbox: stream a turn, execute
//! any tool calls it requested, feed results back, repeat until the model
//! stops calling tools or a stop condition (§4.9) fires.

use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an agent run.
    pub struct RunId("run-");
}

/// Externally visible lifecycle status of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

crate::simple_display! {
    RunStatus {
        Queued => "queued",
        Running => "running",
        Completed => "completed",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Internal phase within one turn of the agent loop (§4.9). Distinct from
/// [`RunStatus`], which callers outside the loop observe; `RunState` is the
/// loop's own program counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Init,
    LlmStream,
    ToolExec,
    Apply,
    NextTurn,
    Complete,
    Failed,
    Cancelled,
}

crate::simple_display! {
    RunState {
        Init => "init",
        LlmStream => "llm_stream",
        ToolExec => "tool_exec",
        Apply => "apply",
        NextTurn => "next_turn",
        Complete => "complete",
        Failed => "failed",
        Cancelled => "cancelled",
    }
}

/// Why the agent loop stopped issuing further turns (§4.9 stop conditions).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStopReason {
    NoToolCalls,
    MaxTurns,
    ToolBudgetExhausted,
    PerTurnToolBudgetExhausted,
    WallTimeExceeded,
    Cancelled,
    Error,
}

crate::simple_display! {
    LoopStopReason {
        NoToolCalls => "no_tool_calls",
        MaxTurns => "max_turns",
        ToolBudgetExhausted => "tool_budget_exhausted",
        PerTurnToolBudgetExhausted => "per_turn_tool_budget_exhausted",
        WallTimeExceeded => "wall_time_exceeded",
        Cancelled => "cancelled",
        Error => "error",
    }
}

/// Coarse outcome recorded once a run reaches a terminal status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    Completed,
    Cancelled,
    Error,
}

crate::simple_display! {
    TerminationReason {
        Completed => "completed",
        Cancelled => "cancelled",
        Error => "error",
    }
}

/// A run's materialized record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Run {
    pub id: RunId,
    pub sandbox_id: crate::sandbox::SandboxId,
    pub user_id: crate::sandbox::UserId,
    pub chat_id: crate::sandbox::ChatId,
    pub status: RunStatus,
    pub turn: u32,
    pub tool_calls_this_turn: u32,
    pub tool_calls_total: u32,
    pub created_at_epoch_ms: u64,
    #[serde(default)]
    pub stop_reason: Option<LoopStopReason>,
    #[serde(default)]
    pub termination_reason: Option<TerminationReason>,
}

impl Run {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            RunStatus::Completed | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

#[cfg(any(test, feature = "test-support"))]
crate::builder! {
    pub struct RunBuilder => Run {
        into {
            user_id: crate::sandbox::UserId = crate::sandbox::UserId::new("user-1"),
            chat_id: crate::sandbox::ChatId = crate::sandbox::ChatId::new("chat-1"),
        }
        set {
            status: RunStatus = RunStatus::Queued,
            turn: u32 = 0,
            tool_calls_this_turn: u32 = 0,
            tool_calls_total: u32 = 0,
            created_at_epoch_ms: u64 = 0,
        }
        option {
            stop_reason: LoopStopReason = None,
            termination_reason: TerminationReason = None,
        }
        computed {
            id: RunId = RunId::new(),
            sandbox_id: crate::sandbox::SandboxId = crate::sandbox::SandboxId::new(),
        }
    }
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
