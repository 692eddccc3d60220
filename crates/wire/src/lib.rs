// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Public streaming wire format.
//!
//! Wire format: one tagged JSON object per SSE `data:` frame, `id: <seq>`
//! carrying the run event log's sequence number for `Last-Event-Id` resumption.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod sse;
mod stream_event;

pub use sse::{encode_frame, ResumeCursor, RunEventRecord, Seq, SeqDeduper};
pub use stream_event::{MetaPhase, StreamEvent, UrlScrapeResult, UrlScrapeStatus};
