// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn empty_plan_is_not_complete() {
    assert!(!Plan::default().is_complete());
}

#[test]
fn plan_is_complete_only_when_every_step_is_done() {
    let mut plan = Plan {
        steps: vec![PlanStep::new("1", "scaffold app"), PlanStep::new("2", "wire routes")],
        ..Plan::default()
    };
    assert!(!plan.is_complete());

    plan.step_mut("1").unwrap().status = StepStatus::Done;
    assert!(!plan.is_complete());

    plan.step_mut("2").unwrap().status = StepStatus::Done;
    assert!(plan.is_complete());
}

#[test]
fn step_mut_returns_none_for_unknown_id() {
    let mut plan = Plan { steps: vec![PlanStep::new("1", "scaffold app")], ..Plan::default() };
    assert!(plan.step_mut("missing").is_none());
}

#[test]
fn new_step_defaults_to_pending() {
    let step = PlanStep::new("1", "scaffold app");
    assert_eq!(step.status, StepStatus::Pending);
    assert!(step.description.is_empty());
}
