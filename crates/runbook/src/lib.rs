// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plan/workflow state (C15, spec §4.16). The agent loop (engine crate)
//! keeps a [`edw_core::Plan`] alongside a run and calls into this crate at
//! turn boundaries to move steps through their lifecycle.

use edw_core::{Plan, PlanStep, StepStatus};

/// Canonical step titles every plan is expected to converge toward, in
/// order. The model doesn't always echo these verbatim, so callers locate
/// "the step named X" via [`fuzzy_match_title`] rather than exact equality.
pub const CANONICAL_STEP_TITLES: &[&str] =
    &["Analyze request", "Resolve dependencies", "Generate code", "Validate & build", "Deliver preview"];

/// Normalizes a title for comparison: lowercase, non-alphanumeric runs
/// collapsed to a single space, trimmed.
fn normalize(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_was_space = true;
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_alphanumeric() {
            out.push(ch);
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    out.trim_end().to_string()
}

/// True if `a` and `b` refer to the same logical step: equal once
/// normalized, or one's normalized form contains the other's as a
/// substring (handles the model shortening or elaborating a title).
pub fn titles_fuzzy_match(a: &str, b: &str) -> bool {
    let (na, nb) = (normalize(a), normalize(b));
    if na.is_empty() || nb.is_empty() {
        return false;
    }
    na == nb || na.contains(&nb) || nb.contains(&na)
}

/// Finds the plan step whose title fuzzy-matches `title`, if any.
pub fn find_step<'a>(plan: &'a mut Plan, title: &str) -> Option<&'a mut PlanStep> {
    plan.steps.iter_mut().find(|s| titles_fuzzy_match(&s.title, title))
}

/// Marks the step matching `title` (and only that step) `in_progress`,
/// unless it's already `done` (done is sticky, spec §4.16).
pub fn mark_in_progress(plan: &mut Plan, title: &str) {
    if let Some(step) = find_step(plan, title) {
        if step.status != StepStatus::Done {
            step.status = StepStatus::InProgress;
        }
    }
}

/// Updates the step matching `title` to `Done` on success or `Failed`
/// otherwise. Only the matching step is touched; every other step keeps
/// its current status.
pub fn update_for_step(plan: &mut Plan, title: &str, success: bool) {
    if let Some(step) = find_step(plan, title) {
        if step.status != StepStatus::Done {
            step.status = if success { StepStatus::Done } else { StepStatus::Failed };
        }
    }
}

/// Merges a freshly generated plan (`incoming`) into `existing`: preserves
/// each retained step's `id`, and once a step is `Done` it stays `Done`
/// regardless of what the incoming plan says (spec §4.16 "sticky done").
/// Steps with no counterpart in `existing` (matched fuzzily by title) are
/// inserted as new, freshly-ided steps.
pub fn merge_plan_update(existing: &Plan, incoming: &Plan) -> Plan {
    let mut merged_steps = Vec::with_capacity(incoming.steps.len());
    for incoming_step in &incoming.steps {
        let prior = existing.steps.iter().find(|s| titles_fuzzy_match(&s.title, &incoming_step.title));
        match prior {
            Some(prior_step) if prior_step.status == StepStatus::Done => {
                merged_steps.push(PlanStep {
                    id: prior_step.id.clone(),
                    title: incoming_step.title.clone(),
                    description: incoming_step.description.clone(),
                    status: StepStatus::Done,
                });
            }
            Some(prior_step) => {
                merged_steps.push(PlanStep {
                    id: prior_step.id.clone(),
                    title: incoming_step.title.clone(),
                    description: incoming_step.description.clone(),
                    status: incoming_step.status,
                });
            }
            None => merged_steps.push(incoming_step.clone()),
        }
    }
    Plan {
        summary: incoming.summary.clone(),
        steps: merged_steps,
        decisions: incoming.decisions.clone(),
        assumptions: incoming.assumptions.clone(),
        last_updated_at_epoch_ms: incoming.last_updated_at_epoch_ms,
    }
}

/// Marks every step that isn't already `Done` as `Failed` with `reason`
/// folded into its description, called before a run is forced to
/// terminate with outstanding plan steps (spec §4.16).
pub fn finalize_before_completion(plan: &mut Plan, reason: &str) {
    for step in plan.steps.iter_mut() {
        if step.status != StepStatus::Done {
            step.status = StepStatus::Failed;
            if !step.description.is_empty() {
                step.description.push_str(" — ");
            }
            step.description.push_str(reason);
        }
    }
}

/// Builds the default five-step plan skeleton (spec §4.16) for a freshly
/// started run, before the model has produced its own plan.
pub fn default_plan() -> Plan {
    Plan {
        summary: String::new(),
        steps: CANONICAL_STEP_TITLES
            .iter()
            .enumerate()
            .map(|(i, title)| PlanStep::new(format!("step-{i}"), *title))
            .collect(),
        decisions: Vec::new(),
        assumptions: Vec::new(),
        last_updated_at_epoch_ms: 0,
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
