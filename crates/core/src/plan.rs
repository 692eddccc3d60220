// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan and step types shared between the engine's run loop and the plan
//! crate's merge/finalize logic (spec §3 `Plan`, §4.16).

use serde::{Deserialize, Serialize};

/// Status of one step within a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    InProgress,
    Done,
    Blocked,
    Failed,
}

crate::simple_display! {
    StepStatus {
        Pending => "pending",
        InProgress => "in_progress",
        Done => "done",
        Blocked => "blocked",
        Failed => "failed",
    }
}

/// One step of a plan, addressed by a stable `id` so later turns can update
/// its status even after the model rewrites its title slightly (§4.16 fuzzy
/// title matching lives in the plan crate, not here).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanStep {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub status: StepStatus,
}

impl PlanStep {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self { id: id.into(), title: title.into(), description: String::new(), status: StepStatus::Pending }
    }
}

/// A run's working plan: what the agent has decided to do, and its progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Plan {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub steps: Vec<PlanStep>,
    #[serde(default)]
    pub decisions: Vec<String>,
    #[serde(default)]
    pub assumptions: Vec<String>,
    #[serde(default)]
    pub last_updated_at_epoch_ms: u64,
}

impl Plan {
    pub fn is_complete(&self) -> bool {
        !self.steps.is_empty() && self.steps.iter().all(|s| s.status == StepStatus::Done)
    }

    pub fn step_mut(&mut self, id: &str) -> Option<&mut PlanStep> {
        self.steps.iter_mut().find(|s| s.id == id)
    }
}

#[cfg(test)]
#[path = "plan_tests.rs"]
mod tests;
