// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use edw_core::job::JobReason;
use edw_core::sandbox::{SandboxId, UserId};
use edw_storage::kv::fake::FakeKvStore;
use std::sync::atomic::{AtomicUsize, Ordering};

struct CountingHandler {
    calls: AtomicUsize,
}

impl CountingHandler {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl JobHandler for CountingHandler {
    async fn handle(&self, _payload: &JobPayload) -> Result<(), Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct PanickingHandler;

#[async_trait]
impl JobHandler for PanickingHandler {
    async fn handle(&self, _payload: &JobPayload) -> Result<(), Error> {
        panic!("boom");
    }
}

fn cleanup_payload() -> JobPayload {
    JobPayload::Cleanup { sandbox_id: SandboxId::new(), user_id: UserId::new("u1"), reason: JobReason::Scheduled }
}

fn make_pool(handler: Arc<dyn JobHandler>) -> (Arc<JobQueue>, WorkerPool) {
    let queue = Arc::new(JobQueue::new(Arc::new(FakeKvStore::new())));
    let noop: Arc<dyn JobHandler> = Arc::new(CountingHandler::new());
    let pool = WorkerPool::new(queue.clone(), handler, noop.clone(), noop);
    (queue, pool)
}

#[tokio::test]
async fn cancelling_before_any_work_returns_immediately_with_zero_processed() {
    // Graceful shutdown (§4.11) means "stop accepting" — if the pool is
    // already cancelled it must never dequeue, even with work waiting.
    let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler::new());
    let (queue, pool) = make_pool(handler);
    queue.enqueue(cleanup_payload(), "s1").await.unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    assert_eq!(pool.run(&cancel).await, 0);
    assert!(queue.dequeue().await.unwrap().is_some(), "pre-cancelled pool must leave the item untouched");
}

#[tokio::test]
async fn dispatching_a_job_with_no_registered_handler_kind_panics() {
    let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler::new());
    let (_queue, pool) = make_pool(handler);
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pool.handler_for("unknown")));
    assert!(result.is_err());
}

#[tokio::test]
async fn finish_on_success_clears_the_dedup_marker_so_re_enqueue_succeeds() {
    let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler::new());
    let (queue, pool) = make_pool(handler);
    let payload = cleanup_payload();
    queue.enqueue(payload.clone(), "s1").await.unwrap();
    let item = queue.dequeue().await.unwrap().unwrap();

    pool.finish(Ok((item, Ok(())))).await;

    assert!(queue.enqueue(payload, "s1").await.unwrap().is_some());
}

#[tokio::test]
async fn finish_retries_on_failure_until_attempts_exhausted_then_dead_letters() {
    let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler::new());
    let (queue, pool) = make_pool(handler);
    queue.enqueue(cleanup_payload(), "s1").await.unwrap();
    let item = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(item.policy.max_attempts, 2);

    // attempt 1 fails -> requeued with attempt incremented to 1
    pool.finish(Ok((item, Err("transient".to_string())))).await;
    let retried = queue.dequeue().await.unwrap().unwrap();
    assert_eq!(retried.attempt, 1);

    // attempt 2 fails -> attempts exhausted, dead-lettered
    pool.finish(Ok((retried, Err("transient again".to_string())))).await;
    assert!(queue.dequeue().await.unwrap().is_none());
    assert_eq!(queue.dead_letters().await.unwrap().len(), 1);
}

#[tokio::test]
async fn handler_panic_is_caught_as_a_failure_not_propagated() {
    let handler = PanickingHandler;
    let payload = cleanup_payload();
    let outcome = std::panic::AssertUnwindSafe(handler.handle(&payload)).catch_unwind().await;
    assert!(outcome.is_err(), "the panic must be caught, not unwind past the handler call");
}

#[tokio::test]
async fn join_error_branch_of_finish_logs_and_drops_without_panicking() {
    // A task that's been aborted (rather than completing Ok/Err) has no
    // item to retry; `finish` must handle that without panicking.
    let handler: Arc<dyn JobHandler> = Arc::new(CountingHandler::new());
    let (_queue, pool) = make_pool(handler);
    let mut set: tokio::task::JoinSet<JobOutcome> = tokio::task::JoinSet::new();
    let handle = set.spawn(async {
        std::future::pending::<()>().await;
        unreachable!()
    });
    handle.abort();
    let joined = set.join_next().await.unwrap();
    assert!(joined.is_err());
    pool.finish(joined).await;
}
