// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fresh_run_is_not_terminal() {
    let run = Run::builder().status(RunStatus::Running).build();
    assert!(!run.is_terminal());
}

#[test]
fn completed_failed_and_cancelled_are_terminal() {
    for status in [RunStatus::Completed, RunStatus::Failed, RunStatus::Cancelled] {
        let run = Run::builder().status(status).build();
        assert!(run.is_terminal(), "{status} should be terminal");
    }
}

#[test]
fn queued_and_running_are_not_terminal() {
    for status in [RunStatus::Queued, RunStatus::Running] {
        let run = Run::builder().status(status).build();
        assert!(!run.is_terminal());
    }
}

#[test]
fn display_strings_are_snake_case() {
    assert_eq!(RunStatus::Running.to_string(), "running");
    assert_eq!(RunState::ToolExec.to_string(), "tool_exec");
    assert_eq!(LoopStopReason::MaxTurns.to_string(), "max_turns");
    assert_eq!(TerminationReason::Error.to_string(), "error");
}

#[test]
fn run_id_round_trips_through_serde_json() {
    let id = RunId::new();
    let json = serde_json::to_string(&id).unwrap();
    let back: RunId = serde_json::from_str(&json).unwrap();
    assert_eq!(id, back);
}
