// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sandbox::SandboxId;

#[test]
fn log_summary_mentions_the_sandbox_id() {
    let sandbox_id = SandboxId::new();
    let event = Event::SandboxExpired { sandbox_id };
    assert!(event.log_summary().contains(sandbox_id.as_str()));
}

#[test]
fn tagged_serde_round_trips_with_type_field() {
    let event = Event::RunStatusChanged {
        run_id: crate::run::RunId::new(),
        status: RunStatus::Completed,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "run_status_changed");
    let back: Event = serde_json::from_value(json).unwrap();
    assert_eq!(event, back);
}

#[test]
fn job_failed_summary_includes_attempt_and_error() {
    let event = Event::JobFailed {
        job_id: JobId::new("backup", &SandboxId::new(), "daily"),
        attempt: 3,
        error: "connection reset".into(),
    };
    let summary = event.log_summary();
    assert!(summary.contains('3'));
    assert!(summary.contains("connection reset"));
}
