// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn fuzzy_match_tolerates_case_and_punctuation() {
    assert!(titles_fuzzy_match("Analyze request", "analyze request!"));
    assert!(titles_fuzzy_match("Validate & build", "validate and build"));
    assert!(!titles_fuzzy_match("Generate code", "Deliver preview"));
}

#[test]
fn fuzzy_match_tolerates_elaboration() {
    assert!(titles_fuzzy_match("Resolve dependencies", "Resolve dependencies for the project"));
}

#[test]
fn mark_in_progress_touches_only_matching_step() {
    let mut plan = default_plan();
    mark_in_progress(&mut plan, "Generate code");
    for step in &plan.steps {
        if step.title == "Generate code" {
            assert_eq!(step.status, StepStatus::InProgress);
        } else {
            assert_eq!(step.status, StepStatus::Pending);
        }
    }
}

#[test]
fn mark_in_progress_does_not_regress_done_step() {
    let mut plan = default_plan();
    plan.steps[0].status = StepStatus::Done;
    mark_in_progress(&mut plan, "Analyze request");
    assert_eq!(plan.steps[0].status, StepStatus::Done);
}

#[test]
fn update_for_step_records_success_and_failure() {
    let mut plan = default_plan();
    update_for_step(&mut plan, "Analyze request", true);
    update_for_step(&mut plan, "Resolve dependencies", false);
    assert_eq!(plan.steps[0].status, StepStatus::Done);
    assert_eq!(plan.steps[1].status, StepStatus::Failed);
}

#[test]
fn merge_plan_update_preserves_id_and_sticky_done() {
    let mut existing = default_plan();
    existing.steps[0].status = StepStatus::Done;
    let original_id = existing.steps[0].id.clone();

    let mut incoming = default_plan();
    incoming.steps[0].id = "different-id".to_string();
    incoming.steps[0].status = StepStatus::Pending;

    let merged = merge_plan_update(&existing, &incoming);
    assert_eq!(merged.steps[0].id, original_id);
    assert_eq!(merged.steps[0].status, StepStatus::Done);
}

#[test]
fn merge_plan_update_inserts_unmatched_incoming_steps() {
    let existing = Plan { steps: vec![], ..Default::default() };
    let incoming = default_plan();
    let merged = merge_plan_update(&existing, &incoming);
    assert_eq!(merged.steps.len(), incoming.steps.len());
}

#[test]
fn finalize_before_completion_fails_remaining_steps_only() {
    let mut plan = default_plan();
    plan.steps[0].status = StepStatus::Done;
    finalize_before_completion(&mut plan, "run cancelled");
    assert_eq!(plan.steps[0].status, StepStatus::Done);
    for step in &plan.steps[1..] {
        assert_eq!(step.status, StepStatus::Failed);
        assert!(step.description.contains("run cancelled"));
    }
}
