// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use edw_core::job::JobReason;
use edw_core::sandbox::{ChatId, SandboxId, UserId};
use edw_storage::kv::fake::FakeKvStore;

fn cleanup_payload(sandbox_id: SandboxId) -> JobPayload {
    JobPayload::Cleanup { sandbox_id, user_id: UserId::new("u1"), reason: JobReason::Scheduled }
}

fn backup_payload(sandbox_id: SandboxId) -> JobPayload {
    JobPayload::Backup {
        sandbox_id,
        user_id: UserId::new("u1"),
        chat_id: ChatId::new("c1"),
        reason: JobReason::Scheduled,
    }
}

#[tokio::test]
async fn enqueue_then_dequeue_round_trips_the_payload() {
    let queue = JobQueue::new(Arc::new(FakeKvStore::new()));
    let sandbox_id = SandboxId::new();
    let job_id = queue.enqueue(cleanup_payload(sandbox_id.clone()), "s1").await.unwrap().unwrap();
    assert_eq!(job_id, JobId::new("cleanup", &sandbox_id, "s1"));

    let item = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(item.job_id, job_id);
    assert_eq!(item.attempt, 0);
    assert_eq!(item.policy.max_attempts, 2);
}

#[tokio::test]
async fn enqueueing_the_same_deterministic_job_id_twice_is_deduped() {
    let queue = JobQueue::new(Arc::new(FakeKvStore::new()));
    let sandbox_id = SandboxId::new();
    let first = queue.enqueue(backup_payload(sandbox_id.clone()), "s1").await.unwrap();
    let second = queue.enqueue(backup_payload(sandbox_id), "s1").await.unwrap();
    assert!(first.is_some());
    assert!(second.is_none(), "re-enqueuing the same job id must be a no-op");
}

#[tokio::test]
async fn dequeue_on_empty_queue_returns_none() {
    let queue = JobQueue::new(Arc::new(FakeKvStore::new()));
    assert!(queue.dequeue().await.unwrap().is_none());
}

#[tokio::test]
async fn requeue_increments_attempt_and_preserves_payload() {
    let queue = JobQueue::new(Arc::new(FakeKvStore::new()));
    let sandbox_id = SandboxId::new();
    queue.enqueue(cleanup_payload(sandbox_id), "s1").await.unwrap();
    let item = queue.dequeue().await.unwrap().unwrap();
    queue.requeue(item.clone()).await.unwrap();

    let retried = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(retried.attempt, 1);
    assert_eq!(retried.job_id, item.job_id);
}

#[tokio::test]
async fn mark_dead_moves_item_to_dead_letters_and_clears_dedup() {
    let queue = JobQueue::new(Arc::new(FakeKvStore::new()));
    let sandbox_id = SandboxId::new();
    let payload = cleanup_payload(sandbox_id.clone());
    queue.enqueue(payload.clone(), "s1").await.unwrap();
    let item = queue.dequeue().await.unwrap().unwrap();
    queue.mark_dead(item).await.unwrap();

    assert_eq!(queue.dead_letters().await.unwrap().len(), 1);
    // dedup marker cleared: re-enqueuing the same job id now succeeds
    assert!(queue.enqueue(payload, "s1").await.unwrap().is_some());
}

#[test]
fn default_retry_policy_matches_spec_defaults_per_job_kind() {
    let build = default_retry_policy("build");
    assert_eq!(build.max_attempts, 3);
    assert_eq!(build.backoff, Backoff::Exponential { base: Duration::from_secs(2) });

    let backup = default_retry_policy("backup");
    assert_eq!(backup.max_attempts, 2);
    assert_eq!(backup.backoff, Backoff::Fixed { delay: Duration::from_secs(1) });

    let cleanup = default_retry_policy("cleanup");
    assert_eq!(cleanup.max_attempts, 2);
    assert_eq!(cleanup.backoff, Backoff::Fixed { delay: Duration::from_secs(1) });
}

#[test]
fn exponential_backoff_doubles_each_attempt() {
    let backoff = Backoff::Exponential { base: Duration::from_secs(2) };
    assert_eq!(backoff.delay_for_attempt(1), Duration::from_secs(2));
    assert_eq!(backoff.delay_for_attempt(2), Duration::from_secs(4));
    assert_eq!(backoff.delay_for_attempt(3), Duration::from_secs(8));
}

#[test]
fn fixed_backoff_is_constant_across_attempts() {
    let backoff = Backoff::Fixed { delay: Duration::from_secs(1) };
    assert_eq!(backoff.delay_for_attempt(1), backoff.delay_for_attempt(5));
}
