// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::sandbox::SandboxId;

#[test]
fn kind_matches_variant_regardless_of_payload() {
    let effect = Effect::ExecInSandbox { sandbox_id: SandboxId::new(), argv: vec!["ls".into()] };
    assert_eq!(effect.kind(), "exec_in_sandbox");
}

#[test]
fn enqueue_job_round_trips_through_json() {
    let effect = Effect::EnqueueJob {
        payload: JobPayload::Cleanup {
            sandbox_id: SandboxId::new(),
            user_id: UserId::new("user-1"),
            reason: crate::job::JobReason::SandboxExpiring,
        },
    };
    let json = serde_json::to_value(&effect).unwrap();
    assert_eq!(json["type"], "enqueue_job");
    let back: Effect = serde_json::from_value(json).unwrap();
    assert_eq!(effect, back);
}
