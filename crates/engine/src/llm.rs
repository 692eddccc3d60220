// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! LLM streaming adapter: one trait, a fake for tests. The real
//! implementation (HTTP streaming against a model provider) lives outside
//! this crate's test-reachable surface; the agent loop (C10) only ever
//! depends on this trait, the same adapter-plus-fake split the teacher uses
//! for its agent process adapter.

use async_trait::async_trait;
use edw_core::Error;
use serde::{Deserialize, Serialize};

/// One tool call the model requested during a turn, distinct from the
/// content chunks fed to the stream parser (§4.8 parses `Thinking`/
/// `edward_sandbox`/`file` markup out of the text; tool calls are a
/// separate structured channel the same turn carries alongside it, per
/// §4.9's tool-call vocabulary `command, install, web_search, url_scrape,
/// file`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRequest {
    pub name: String,
    pub input: serde_json::Value,
}

/// Everything one LLM turn produced: text to parse, plus any tool calls
/// requested alongside it.
#[derive(Debug, Clone, Default)]
pub struct TurnOutput {
    pub chunks: Vec<String>,
    pub tool_calls: Vec<ToolCallRequest>,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn stream_turn(&self, api_key: &str, model: &str, prompt: &str) -> Result<TurnOutput, Error>;
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;

    /// Replays a fixed script of turns. Once exhausted, repeats the final
    /// entry (a turn with no tool calls) so a test driving past its
    /// authored script still converges on `NoToolCalls` instead of panicking.
    pub struct FakeLlmClient {
        script: Mutex<Vec<TurnOutput>>,
        pub prompts_seen: Mutex<Vec<String>>,
    }

    impl FakeLlmClient {
        pub fn new(script: Vec<TurnOutput>) -> Self {
            Self { script: Mutex::new(script), prompts_seen: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl LlmClient for FakeLlmClient {
        async fn stream_turn(&self, _api_key: &str, _model: &str, prompt: &str) -> Result<TurnOutput, Error> {
            self.prompts_seen.lock().push(prompt.to_string());
            let mut script = self.script.lock();
            if script.len() > 1 {
                Ok(script.remove(0))
            } else {
                Ok(script.first().cloned().unwrap_or_default())
            }
        }
    }
}
