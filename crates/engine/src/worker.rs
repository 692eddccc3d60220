// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pool (C12, spec §4.11): drains [`JobQueue`], dispatches each item
//! to the handler registered for its payload kind, retries failures up to
//! the item's policy and dead-letters the rest. Concurrency and graceful
//! drain follow the same shape as the teacher's
//! `engine/runtime/handlers/worker/dispatch.rs` poll-and-dispatch loop,
//! adapted from its in-process `Runtime` state onto the queue's own
//! `KvStore`-backed pop/retry primitives.

use crate::queue::{JobQueue, QueueItem};
use async_trait::async_trait;
use edw_core::job::JobPayload;
use edw_core::Error;
use futures_util::FutureExt;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

pub const WORKER_CONCURRENCY: usize = 3;

/// One handler per job kind. A handler panic is caught inside the spawned
/// task and treated as a failed attempt, per §4.11 ("panics propagate as
/// failures").
#[async_trait]
pub trait JobHandler: Send + Sync {
    async fn handle(&self, payload: &JobPayload) -> Result<(), Error>;
}

type JobOutcome = (QueueItem, Result<(), String>);

/// Runs up to [`WORKER_CONCURRENCY`] jobs at once, polling `queue` for work
/// until `cancel` fires. On cancellation: stop popping new items, let
/// in-flight handlers finish (drain), then return.
pub struct WorkerPool {
    queue: Arc<JobQueue>,
    build: Arc<dyn JobHandler>,
    backup: Arc<dyn JobHandler>,
    cleanup: Arc<dyn JobHandler>,
    concurrency: usize,
}

impl WorkerPool {
    pub fn new(
        queue: Arc<JobQueue>,
        build: Arc<dyn JobHandler>,
        backup: Arc<dyn JobHandler>,
        cleanup: Arc<dyn JobHandler>,
    ) -> Self {
        Self { queue, build, backup, cleanup, concurrency: WORKER_CONCURRENCY }
    }

    fn handler_for(&self, kind: &str) -> Arc<dyn JobHandler> {
        match kind {
            "build" => self.build.clone(),
            "backup" => self.backup.clone(),
            "cleanup" => self.cleanup.clone(),
            other => panic!("no handler registered for job kind {other}"),
        }
    }

    /// Runs the pool until `cancel` fires, then drains in-flight jobs before
    /// returning. Returns the number of jobs that reached a terminal state
    /// (succeeded or dead-lettered) during this call.
    pub async fn run(&self, cancel: &CancellationToken) -> usize {
        let mut in_flight: JoinSet<JobOutcome> = JoinSet::new();
        let mut terminal = 0usize;

        loop {
            if cancel.is_cancelled() {
                break;
            }

            while in_flight.len() < self.concurrency {
                let item = match self.queue.dequeue().await {
                    Ok(Some(item)) => item,
                    Ok(None) => break,
                    Err(e) => {
                        error!(error = %e, "failed to poll job queue");
                        break;
                    }
                };
                let handler = self.handler_for(item.payload.kind());
                in_flight.spawn(async move {
                    let outcome = std::panic::AssertUnwindSafe(handler.handle(&item.payload))
                        .catch_unwind()
                        .await;
                    let result = match outcome {
                        Ok(Ok(())) => Ok(()),
                        Ok(Err(e)) => Err(e.to_string()),
                        Err(_) => Err("job handler panicked".to_string()),
                    };
                    (item, result)
                });
            }

            if in_flight.is_empty() {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(std::time::Duration::from_millis(200)) => {}
                }
                continue;
            }

            tokio::select! {
                _ = cancel.cancelled() => break,
                joined = in_flight.join_next() => {
                    if let Some(joined) = joined {
                        self.finish(joined).await;
                        terminal += 1;
                    }
                }
            }
        }

        info!(in_flight = in_flight.len(), "worker pool shutting down, draining in-flight jobs");
        while let Some(joined) = in_flight.join_next().await {
            self.finish(joined).await;
            terminal += 1;
        }
        terminal
    }

    async fn finish(&self, joined: Result<JobOutcome, tokio::task::JoinError>) {
        match joined {
            Ok((item, Ok(()))) => {
                if let Err(e) = self.queue.mark_completed(&item).await {
                    error!(job_id = %item.job_id, error = %e, "failed to clear dedup marker after success");
                }
            }
            Ok((item, Err(reason))) => self.retry_or_kill(item, &reason).await,
            Err(join_error) => {
                error!(error = %join_error, "worker task aborted unexpectedly, item lost");
            }
        }
    }

    async fn retry_or_kill(&self, item: QueueItem, reason: &str) {
        let next_attempt = item.attempt + 1;
        if next_attempt >= item.policy.max_attempts {
            warn!(job_id = %item.job_id, attempts = next_attempt, reason, "job exhausted retries, dead-lettering");
            if let Err(e) = self.queue.mark_dead(item).await {
                error!(error = %e, "failed to dead-letter job");
            }
            return;
        }

        let delay = item.policy.backoff.delay_for_attempt(next_attempt);
        warn!(job_id = %item.job_id, attempt = next_attempt, delay_ms = delay.as_millis() as u64, reason, "retrying job after backoff");
        tokio::time::sleep(delay).await;
        if let Err(e) = self.queue.requeue(item).await {
            error!(error = %e, "failed to requeue job for retry");
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
