// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job queue (C12, spec §4.11): a `KvStore`-backed FIFO with deterministic,
//! dedup-friendly job IDs and per-type retry defaults. Grounded on the
//! teacher's `crates/storage/src/state/queues.rs` queue-item lifecycle
//! (`Pending -> Active -> Completed|Failed -> Dead`), adapted from that
//! crate's in-process event-sourced state onto the shared `KvStore` list
//! primitives so queue state survives a daemon restart.

use edw_core::job::JobPayload;
use edw_core::{Error, JobId};
use edw_storage::KvStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const PENDING_KEY: &str = "queue:pending";
const DEAD_KEY: &str = "queue:dead";
fn seen_key(job_id: &JobId) -> String {
    format!("queue:seen:{job_id}")
}

/// How a failed attempt's next try is delayed. Mirrors the three shapes the
/// spec names for build/backup/cleanup rather than a single generic curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Backoff {
    Exponential { base: Duration },
    Fixed { delay: Duration },
}

impl Backoff {
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Backoff::Exponential { base } => *base * 2u32.pow(attempt.saturating_sub(1)),
            Backoff::Fixed { delay } => *delay,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// Per-type retry defaults (§4.11): build attempts=3 exponential 2s; backup
/// attempts=2 fixed 1s; cleanup attempts=2 delay 1s.
pub fn default_retry_policy(job_kind: &str) -> RetryPolicy {
    match job_kind {
        "build" => RetryPolicy { max_attempts: 3, backoff: Backoff::Exponential { base: Duration::from_secs(2) } },
        "backup" => RetryPolicy { max_attempts: 2, backoff: Backoff::Fixed { delay: Duration::from_secs(1) } },
        "cleanup" => RetryPolicy { max_attempts: 2, backoff: Backoff::Fixed { delay: Duration::from_secs(1) } },
        other => panic!("no default retry policy for job kind {other}"),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub job_id: JobId,
    pub payload: JobPayload,
    pub attempt: u32,
    pub policy: RetryPolicy,
}

/// A FIFO of [`QueueItem`]s plus a dead-letter list, backed by two
/// `KvStore` lists. Enqueue is deduped on the deterministic job ID via
/// `set_if_not_exists` so a reconciliation pass that decides the same
/// sandbox needs a backup twice collapses to one queue entry (§4.11).
pub struct JobQueue {
    kv: Arc<dyn KvStore>,
}

impl JobQueue {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv }
    }

    /// Enqueues `payload` under a job ID deterministic in `(kind, sandbox_id,
    /// suffix)`. Returns `Ok(None)` without pushing if that job ID was
    /// already enqueued (dedup window: until the job completes or dies).
    pub async fn enqueue(&self, payload: JobPayload, suffix: &str) -> Result<Option<JobId>, Error> {
        let job_id = payload.job_id(suffix);
        let policy = default_retry_policy(payload.kind());
        let fresh = self.kv.set_if_not_exists(&seen_key(&job_id), "1", Duration::from_secs(24 * 3600)).await?;
        if !fresh {
            return Ok(None);
        }
        let item = QueueItem { job_id: job_id.clone(), payload, attempt: 0, policy };
        let encoded = serde_json::to_string(&item).map_err(|e| Error::Internal(e.to_string()))?;
        self.kv.list_append(PENDING_KEY, &encoded).await?;
        Ok(Some(job_id))
    }

    /// Pops the oldest pending item, if any.
    pub async fn dequeue(&self) -> Result<Option<QueueItem>, Error> {
        match self.kv.list_pop_front(PENDING_KEY).await? {
            Some(encoded) => {
                let item: QueueItem = serde_json::from_str(&encoded).map_err(|e| Error::Internal(e.to_string()))?;
                Ok(Some(item))
            }
            None => Ok(None),
        }
    }

    /// Re-enqueues `item` with `attempt` incremented for another try.
    pub async fn requeue(&self, mut item: QueueItem) -> Result<(), Error> {
        item.attempt += 1;
        let encoded = serde_json::to_string(&item).map_err(|e| Error::Internal(e.to_string()))?;
        self.kv.list_append(PENDING_KEY, &encoded).await
    }

    /// Moves `item` to the dead-letter list once its attempts are
    /// exhausted, and clears the dedup marker so a future explicit
    /// re-enqueue of the same logical job is accepted.
    pub async fn mark_dead(&self, item: QueueItem) -> Result<(), Error> {
        self.kv.delete(&seen_key(&item.job_id)).await?;
        let encoded = serde_json::to_string(&item).map_err(|e| Error::Internal(e.to_string()))?;
        self.kv.list_append(DEAD_KEY, &encoded).await
    }

    /// Clears the dedup marker for a successfully completed job so a later
    /// legitimate re-run (e.g. a new backup cycle) isn't blocked forever.
    pub async fn mark_completed(&self, item: &QueueItem) -> Result<(), Error> {
        self.kv.delete(&seen_key(&item.job_id)).await
    }

    pub async fn dead_letters(&self) -> Result<Vec<QueueItem>, Error> {
        let encoded = self.kv.list_range_from(DEAD_KEY, 0).await?;
        encoded
            .into_iter()
            .map(|e| serde_json::from_str(&e).map_err(|err| Error::Internal(err.to_string())))
            .collect()
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
