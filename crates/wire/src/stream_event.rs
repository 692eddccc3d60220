// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The public stream event wire format (spec §6): one tagged JSON object per
//! SSE `data:` frame, NDJSON-shaped. Every variant round-trips through
//! `serde_json` with a `type` discriminant; field names are camelCase on the
//! wire to match the external contract, not the rest of this workspace's
//! snake_case Rust conventions.

use edw_core::build::BuildStatus;
use edw_core::run::{LoopStopReason, RunId, TerminationReason};
use serde::{Deserialize, Serialize};

/// One frame of the public agent-run stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum StreamEvent {
    Meta {
        chat_id: String,
        user_message_id: String,
        assistant_message_id: String,
        is_new_chat: bool,
        run_id: RunId,
        phase: MetaPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        loop_stop_reason: Option<LoopStopReason>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        termination_reason: Option<TerminationReason>,
    },
    Text {
        content: String,
    },
    ThinkingStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    ThinkingContent {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    ThinkingEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
    },
    SandboxStart {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base: Option<String>,
    },
    SandboxEnd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        project: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        base: Option<String>,
    },
    FileStart {
        path: String,
    },
    FileContent {
        path: String,
        content: String,
    },
    FileEnd {
        path: String,
    },
    Command {
        command: String,
        args: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stdout: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stderr: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        exit_code: Option<i32>,
    },
    WebSearch {
        query: String,
        max_results: u32,
    },
    UrlScrape {
        results: Vec<UrlScrapeResult>,
    },
    Metrics {
        completion_time: u64,
        input_tokens: u64,
        output_tokens: u64,
    },
    BuildStatus {
        chat_id: String,
        status: BuildStatus,
        build_id: edw_core::build::BuildId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        preview_url: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error_log: Option<String>,
    },
    Error {
        message: String,
    },
}

/// Which leg of a run a `meta` frame marks (spec §6 `meta` type).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetaPhase {
    SessionStart,
    SessionComplete,
}

/// One URL's scrape outcome within a `url_scrape` frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlScrapeResult {
    pub status: UrlScrapeStatus,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlScrapeStatus {
    Ok,
    Error,
}

impl StreamEvent {
    /// Whether this frame marks the end of a run's event stream (spec §4.10
    /// "completion" lookup: the latest `meta/session_complete`).
    pub fn is_session_complete(&self) -> bool {
        matches!(self, StreamEvent::Meta { phase: MetaPhase::SessionComplete, .. })
    }

    /// The `eventType` recorded alongside this frame in the run event log
    /// (§4.10) — the same discriminant serde uses for `type` on the wire.
    pub fn event_type(&self) -> &'static str {
        match self {
            StreamEvent::Meta { .. } => "meta",
            StreamEvent::Text { .. } => "text",
            StreamEvent::ThinkingStart { .. } => "thinking_start",
            StreamEvent::ThinkingContent { .. } => "thinking_content",
            StreamEvent::ThinkingEnd { .. } => "thinking_end",
            StreamEvent::SandboxStart { .. } => "sandbox_start",
            StreamEvent::SandboxEnd { .. } => "sandbox_end",
            StreamEvent::FileStart { .. } => "file_start",
            StreamEvent::FileContent { .. } => "file_content",
            StreamEvent::FileEnd { .. } => "file_end",
            StreamEvent::Command { .. } => "command",
            StreamEvent::WebSearch { .. } => "web_search",
            StreamEvent::UrlScrape { .. } => "url_scrape",
            StreamEvent::Metrics { .. } => "metrics",
            StreamEvent::BuildStatus { .. } => "build_status",
            StreamEvent::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
#[path = "stream_event_tests.rs"]
mod tests;
