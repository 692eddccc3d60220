// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! SSE framing and resumption cursor for the run event stream (spec §4.10,
//! §6). The daemon owns the actual HTTP response writer; this module owns
//! the wire shape: how a `(seq, StreamEvent)` pair becomes a frame, and how
//! a client's `Last-Event-Id` header becomes a resumption cursor.

use crate::stream_event::StreamEvent;

/// Sequence number assigned by the run event log (§4.10 `append`). Ordering
/// is authoritative: a client never needs wall-clock time to dedup or order
/// events, only this value.
pub type Seq = u64;

/// One `(seq, event)` pair as it leaves the run event log, before framing.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RunEventRecord {
    pub seq: Seq,
    pub event: StreamEvent,
}

/// Render one run event as an SSE frame: `id: <seq>` followed by a `data:`
/// line carrying the JSON-encoded event, per spec §4.10/§6.
pub fn encode_frame(record: &RunEventRecord) -> Result<String, serde_json::Error> {
    let payload = serde_json::to_string(&record.event)?;
    Ok(format!("id: {}\ndata: {payload}\n\n", record.seq))
}

/// A client's resumption position, parsed from the `Last-Event-Id` header
/// (or an explicit `(runId, lastSeq)` pair on first connect).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResumeCursor {
    pub last_seq: Seq,
}

impl ResumeCursor {
    pub const START: ResumeCursor = ResumeCursor { last_seq: 0 };

    /// Parse a `Last-Event-Id` header value. Anything unparsable resumes
    /// from the start rather than erroring — a stale or malformed cursor
    /// should not break reconnection.
    pub fn parse(last_event_id: Option<&str>) -> Self {
        match last_event_id.and_then(|s| s.parse::<Seq>().ok()) {
            Some(last_seq) => ResumeCursor { last_seq },
            None => Self::START,
        }
    }
}

/// Dedups a live-stream event against the position already drained from
/// `readAfter` (spec §4.10: "duplicate seq from the live stream is deduped
/// by seq"). Feed records in arrival order; returns `true` for records that
/// should be forwarded to the client.
#[derive(Debug, Default)]
pub struct SeqDeduper {
    highest_seen: Option<Seq>,
}

impl SeqDeduper {
    pub fn new(after: Seq) -> Self {
        Self { highest_seen: Some(after) }
    }

    pub fn admit(&mut self, seq: Seq) -> bool {
        let is_new = match self.highest_seen {
            Some(highest) => seq > highest,
            None => true,
        };
        if is_new {
            self.highest_seen = Some(seq);
        }
        is_new
    }
}

#[cfg(test)]
#[path = "sse_tests.rs"]
mod tests;
