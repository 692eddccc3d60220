// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Run event log & resumption (C11, spec §4.10). `append` is a single
//! logical transaction: bump `run.nextEventSeq`, insert `(runId, seq,
//! event)`, publish on `run-events:<runId>` — in that order, so a reader
//! draining history and a reader subscribed live can never see a gap or a
//! reordering relative to each other.

use crate::kv::KvStore;
use edw_core::{Error, RunId};
use edw_wire::{RunEventRecord, Seq, StreamEvent};
use std::sync::Arc;
use tokio::sync::broadcast;

const DEFAULT_READ_LIMIT: usize = 500;
const CHANNEL_CAPACITY: usize = 1024;

pub struct RunEventLog {
    kv: Arc<dyn KvStore>,
    channels: parking_lot::Mutex<std::collections::HashMap<String, broadcast::Sender<RunEventRecord>>>,
}

impl RunEventLog {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self { kv, channels: parking_lot::Mutex::new(std::collections::HashMap::new()) }
    }

    fn seq_key(run_id: &RunId) -> String {
        format!("run:seq:{run_id}")
    }

    fn log_key(run_id: &RunId) -> String {
        format!("run:events:{run_id}")
    }

    fn channel(&self, run_id: &RunId) -> broadcast::Sender<RunEventRecord> {
        self.channels
            .lock()
            .entry(run_id.to_string())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    /// Subscribes to live events for `run_id`. Must be called before
    /// `readAfter` so events published between the historical read and the
    /// subscription aren't missed; `SeqDeduper` on the caller side collapses
    /// the resulting overlap.
    pub fn subscribe(&self, run_id: &RunId) -> broadcast::Receiver<RunEventRecord> {
        self.channel(run_id).subscribe()
    }

    /// Appends one event, returning its authoritative sequence number.
    pub async fn append(&self, run_id: &RunId, event: StreamEvent) -> Result<Seq, Error> {
        let seq = self.kv.incr(&Self::seq_key(run_id)).await? as Seq;
        let record = RunEventRecord { seq, event };
        let payload = serde_json::to_string(&record).map_err(|e| Error::Internal(e.to_string()))?;
        self.kv.list_append(&Self::log_key(run_id), &payload).await?;
        // A channel with no subscribers drops the send; that's fine, a
        // reconnecting client replays from readAfter instead.
        let _ = self.channel(run_id).send(record);
        Ok(seq)
    }

    /// Returns events with `seq > after_seq`, ascending, capped at `limit`
    /// (defaults to 500 per spec §4.10).
    pub async fn read_after(
        &self,
        run_id: &RunId,
        after_seq: Seq,
        limit: Option<usize>,
    ) -> Result<Vec<RunEventRecord>, Error> {
        let raw = self.kv.list_range_from(&Self::log_key(run_id), 0).await?;
        let limit = limit.unwrap_or(DEFAULT_READ_LIMIT);
        let mut out = Vec::new();
        for entry in raw {
            let record: RunEventRecord =
                serde_json::from_str(&entry).map_err(|e| Error::Internal(e.to_string()))?;
            if record.seq > after_seq {
                out.push(record);
                if out.len() >= limit {
                    break;
                }
            }
        }
        Ok(out)
    }

    /// True once a `meta` event with `is_session_complete()` has been
    /// appended for this run — the resumption protocol's completion check.
    pub async fn is_complete(&self, run_id: &RunId) -> Result<bool, Error> {
        let raw = self.kv.list_range_from(&Self::log_key(run_id), 0).await?;
        for entry in raw {
            let record: RunEventRecord =
                serde_json::from_str(&entry).map_err(|e| Error::Internal(e.to_string()))?;
            if record.event.is_session_complete() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

#[cfg(test)]
#[path = "run_log_tests.rs"]
mod tests;
