// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::run::RunId;

#[test]
fn idempotency_key_is_stable_for_same_input() {
    let run_id = RunId::new();
    let input = serde_json::json!({"command": "npm install"});
    let a = RunToolCall::idempotency_key(&run_id, 1, "runCommand", &input);
    let b = RunToolCall::idempotency_key(&run_id, 1, "runCommand", &input);
    assert_eq!(a, b);
}

#[test]
fn idempotency_key_differs_by_turn() {
    let run_id = RunId::new();
    let input = serde_json::json!({"command": "npm install"});
    let a = RunToolCall::idempotency_key(&run_id, 1, "runCommand", &input);
    let b = RunToolCall::idempotency_key(&run_id, 2, "runCommand", &input);
    assert_ne!(a, b);
}

#[test]
fn idempotency_key_differs_by_input() {
    let run_id = RunId::new();
    let a = RunToolCall::idempotency_key(&run_id, 1, "runCommand", &serde_json::json!({"x": 1}));
    let b = RunToolCall::idempotency_key(&run_id, 1, "runCommand", &serde_json::json!({"x": 2}));
    assert_ne!(a, b);
}

#[test]
fn builder_defaults_to_pending() {
    let call = RunToolCall::builder().build();
    assert_eq!(call.status, ToolCallStatus::Pending);
    assert!(call.output.is_none());
}
