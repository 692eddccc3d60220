// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent loop (C10, spec §4.9): per-run multi-turn orchestration. One
//! `AgentLoop::run` call streams an LLM turn through the stream parser
//! (C9), executes the pending tool calls it surfaced under the command
//! gateway (C6) against a sandbox container (C5), and recurses with a
//! continuation prompt until a stop condition fires.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use edw_core::clock::Clock;
use edw_core::run::{LoopStopReason, RunId, TerminationReason};
use edw_core::sandbox::{ChatId, SandboxId, UserId};
use edw_core::Error;
use edw_container::{CandidateFile, ContainerDriver, ContainerHandle, ExecOptions};
use edw_storage::{KvStore, RunEventLog, SlotLimiter};
use edw_wire::StreamEvent;
use sha2::{Digest, Sha256};
use tokio_util::sync::CancellationToken;

use crate::llm::{LlmClient, ToolCallRequest};
use crate::parser::StreamParser;

pub const MAX_AGENT_TURNS: u32 = 5;
pub const MAX_AGENT_TOOL_CALLS_PER_RUN: u32 = 18;
pub const MAX_AGENT_TOOL_CALLS_PER_TURN: u32 = 6;
pub const MAX_STREAM_DURATION_MS: u64 = 5 * 60 * 1000;
pub const MAX_AGENT_CONTINUATION_PROMPT_CHARS: usize = 18_000;
pub const MAX_AGENT_TOOL_RESULT_PAYLOAD_CHARS: usize = 24_000;
pub const MAX_TOOL_STDIO_CHARS: usize = 4_000;
const TRUNCATION_MARKER: &str = "...[truncated]";
const IDEMPOTENCY_TTL: Duration = Duration::from_secs(3600);

/// Everything one run needs that isn't part of the conversation itself.
pub struct RunContext {
    pub run_id: RunId,
    pub user_id: UserId,
    pub chat_id: ChatId,
    pub sandbox_id: SandboxId,
    pub container: ContainerHandle,
    pub workdir: String,
    pub api_key: String,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoopOutcome {
    pub stop_reason: LoopStopReason,
    pub termination_reason: TerminationReason,
    pub turns: u32,
    pub tool_calls_total: u32,
}

struct ToolExecutionRecord {
    name: String,
    input: serde_json::Value,
    output: serde_json::Value,
}

struct TurnResult {
    tool_calls_run: u32,
    executions: Vec<ToolExecutionRecord>,
}

pub struct AgentLoop<C: Clock> {
    limiter: Arc<SlotLimiter>,
    run_log: Arc<RunEventLog>,
    container: Arc<dyn ContainerDriver>,
    llm: Arc<dyn LlmClient>,
    idempotency: Arc<dyn KvStore>,
    clock: C,
}

impl<C: Clock> AgentLoop<C> {
    pub fn new(
        limiter: Arc<SlotLimiter>,
        run_log: Arc<RunEventLog>,
        container: Arc<dyn ContainerDriver>,
        llm: Arc<dyn LlmClient>,
        idempotency: Arc<dyn KvStore>,
        clock: C,
    ) -> Self {
        Self { limiter, run_log, container, llm, idempotency, clock }
    }

    /// Runs `ctx` to completion: `INIT -> LLM_STREAM (-> TOOL_EXEC ->
    /// NEXT_TURN)* -> COMPLETE|FAILED|CANCELLED` (§4.9). Never returns
    /// `Err` for in-run failures (those become `LoopStopReason::Error`);
    /// `Err` is reserved for conditions that prevent the run from starting
    /// at all (no slot on the very first turn counts as a normal stop, not
    /// an error, per spec step 1 — callers that want that distinction
    /// surfaced check `stop_reason`).
    pub async fn run(
        &self,
        ctx: &RunContext,
        user_request: &str,
        history: &[String],
        cancel: &CancellationToken,
    ) -> LoopOutcome {
        let start = self.clock.now();
        let mut turn: u32 = 0;
        let mut tool_calls_total: u32 = 0;
        let mut prompt = build_initial_prompt(user_request, history);

        loop {
            if cancel.is_cancelled() {
                return self.outcome(LoopStopReason::Cancelled, TerminationReason::Cancelled, turn, tool_calls_total);
            }

            turn += 1;
            let turn_outcome = self
                .limiter
                .with(ctx.user_id.as_str(), || self.run_turn(ctx, turn, &prompt, cancel))
                .await;

            let turn_result = match turn_outcome {
                Err(Error::RateLimited) => {
                    return self.outcome(LoopStopReason::Error, TerminationReason::Error, turn - 1, tool_calls_total);
                }
                Err(_) => unreachable!("SlotLimiter::with only raises RateLimited"),
                Ok(Err(e)) => {
                    tracing::warn!(run_id = %ctx.run_id, turn, error = %e, "agent turn failed");
                    return self.outcome(LoopStopReason::Error, TerminationReason::Error, turn, tool_calls_total);
                }
                Ok(Ok(result)) => result,
            };

            tool_calls_total += turn_result.tool_calls_run;
            let elapsed_ms = self.clock.now().saturating_duration_since(start).as_millis() as u64;

            if cancel.is_cancelled() {
                return self.outcome(LoopStopReason::Cancelled, TerminationReason::Cancelled, turn, tool_calls_total);
            }

            if let Some(stop_reason) =
                decide_stop_reason(turn_result.tool_calls_run, turn, tool_calls_total, elapsed_ms)
            {
                let termination = if stop_reason == LoopStopReason::Error {
                    TerminationReason::Error
                } else {
                    TerminationReason::Completed
                };
                return self.outcome(stop_reason, termination, turn, tool_calls_total);
            }

            prompt = build_continuation_prompt(&prompt, &turn_result.executions);
        }
    }

    fn outcome(&self, stop_reason: LoopStopReason, termination_reason: TerminationReason, turns: u32, tool_calls_total: u32) -> LoopOutcome {
        LoopOutcome { stop_reason, termination_reason, turns, tool_calls_total }
    }

    /// Runs one LLM_STREAM/TOOL_EXEC pair: stream a turn, parse it, append
    /// every event to the run log, then execute whatever it asked for.
    async fn run_turn(
        &self,
        ctx: &RunContext,
        turn: u32,
        prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<TurnResult, Error> {
        let turn_output = self.llm.stream_turn(&ctx.api_key, &ctx.model, prompt).await?;

        let mut parser = StreamParser::new();
        let mut events = Vec::new();
        for chunk in &turn_output.chunks {
            events.extend(parser.process(chunk));
        }
        events.extend(parser.flush());

        for event in &events {
            self.run_log.append(&ctx.run_id, event.clone()).await?;
        }

        if cancel.is_cancelled() {
            return Ok(TurnResult { tool_calls_run: 0, executions: Vec::new() });
        }

        let mut executions = Vec::new();
        for file in collect_finished_files(&events) {
            let outcome = self.execute_with_idempotency(ctx, turn, "file", serde_json::json!({ "path": file.0, "content": file.1 })).await;
            executions.push(self.record_outcome("file", outcome));
        }
        for call in &turn_output.tool_calls {
            let outcome = self.execute_with_idempotency(ctx, turn, &call.name, call.input.clone()).await;
            executions.push(self.record_outcome(&call.name, outcome));
        }

        Ok(TurnResult { tool_calls_run: executions.len() as u32, executions })
    }

    fn record_outcome(&self, name: &str, outcome: Result<serde_json::Value, Error>) -> ToolExecutionRecord {
        match outcome {
            Ok(output) => ToolExecutionRecord { name: name.to_string(), input: serde_json::Value::Null, output },
            Err(e) => ToolExecutionRecord {
                name: name.to_string(),
                input: serde_json::Value::Null,
                output: serde_json::json!({ "error": e.to_string() }),
            },
        }
    }

    /// Looks up the cached output for `(turn, tool_name, input)` before
    /// dispatching; stores the fresh result keyed the same way (§4.9 "on
    /// duplicate key, reuse the stored output").
    async fn execute_with_idempotency(
        &self,
        ctx: &RunContext,
        turn: u32,
        tool_name: &str,
        input: serde_json::Value,
    ) -> Result<serde_json::Value, Error> {
        let canonical_input = input.to_string();
        let key = idempotency_key(&ctx.run_id, turn, tool_name, &canonical_input);
        if let Some(cached) = self.idempotency.get(&key).await? {
            return serde_json::from_str(&cached).map_err(|e| Error::Internal(e.to_string()));
        }

        let output = self.dispatch_tool(ctx, tool_name, &input).await?;
        let serialized = serde_json::to_string(&output).map_err(|e| Error::Internal(e.to_string()))?;
        self.idempotency.set_with_ttl(&key, &serialized, IDEMPOTENCY_TTL).await?;
        Ok(output)
    }

    async fn dispatch_tool(&self, ctx: &RunContext, tool_name: &str, input: &serde_json::Value) -> Result<serde_json::Value, Error> {
        match tool_name {
            "command" | "install" => self.exec_command(ctx, input).await,
            "web_search" => self.web_search(input).await,
            "url_scrape" => self.url_scrape(input).await,
            "file" => self.write_file(ctx, input).await,
            other => Err(Error::InvalidArg(format!("unknown tool call: {other}"))),
        }
    }

    async fn exec_command(&self, ctx: &RunContext, input: &serde_json::Value) -> Result<serde_json::Value, Error> {
        let command = input.get("command").and_then(|v| v.as_str()).ok_or_else(|| Error::InvalidArg("command tool call missing `command`".to_string()))?;
        let args: Vec<String> = input
            .get("args")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        edw_gateway::validate(command, &args, Path::new(&ctx.workdir))?;

        let mut argv = vec![command.to_string()];
        argv.extend(args);
        let result = self.container.exec(&ctx.container, &argv, ExecOptions { workdir: Some(ctx.workdir.clone()), ..Default::default() }).await?;

        Ok(serde_json::json!({
            "exitCode": result.exit_code,
            "stdout": truncate_chars(&result.stdout, MAX_TOOL_STDIO_CHARS),
            "stderr": truncate_chars(&result.stderr, MAX_TOOL_STDIO_CHARS),
        }))
    }

    async fn write_file(&self, ctx: &RunContext, input: &serde_json::Value) -> Result<serde_json::Value, Error> {
        let path = input.get("path").and_then(|v| v.as_str()).ok_or_else(|| Error::InvalidArg("file tool call missing `path`".to_string()))?;
        let content = input.get("content").and_then(|v| v.as_str()).unwrap_or_default();

        let candidate = CandidateFile { rel_path: path.to_string(), size: content.len() as u64, contents: content.as_bytes().to_vec() };
        let tar_gz = edw_container::build_tar_gz(&[candidate])?;
        self.container.put_archive(&ctx.container, tar_gz, &ctx.workdir).await?;

        Ok(serde_json::json!({ "path": path, "written": true }))
    }

    async fn web_search(&self, input: &serde_json::Value) -> Result<serde_json::Value, Error> {
        let query = input.get("query").and_then(|v| v.as_str()).unwrap_or_default();
        let max_results = input.get("maxResults").and_then(|v| v.as_u64()).unwrap_or(5);

        let client = reqwest::Client::new();
        let response = client
            .get("https://api.search.edward.internal/v1/search")
            .query(&[("q", query), ("n", &max_results.to_string())])
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| Error::Internal(format!("web search request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(Error::Internal(format!("web search returned {}", response.status())));
        }
        let body: serde_json::Value = response.json().await.map_err(|e| Error::Internal(format!("web search body parse failed: {e}")))?;
        Ok(serde_json::json!({ "query": query, "results": body.get("results").cloned().unwrap_or(serde_json::json!([])) }))
    }

    async fn url_scrape(&self, input: &serde_json::Value) -> Result<serde_json::Value, Error> {
        let urls: Vec<String> = input
            .get("urls")
            .and_then(|v| v.as_array())
            .map(|a| a.iter().filter_map(|v| v.as_str().map(str::to_string)).collect())
            .unwrap_or_default();

        let client = reqwest::Client::new();
        let mut results = Vec::new();
        for url in urls {
            let scraped = match client.get(&url).timeout(Duration::from_secs(5)).send().await {
                Ok(response) => {
                    let final_url = response.url().to_string();
                    match response.text().await {
                        Ok(body) => serde_json::json!({
                            "status": "ok",
                            "url": url,
                            "finalUrl": final_url,
                            "title": extract_title(&body),
                            "excerpt": truncate_chars(&strip_tags(&body), 500),
                        }),
                        Err(e) => serde_json::json!({ "status": "error", "url": url, "error": e.to_string() }),
                    }
                }
                Err(e) => serde_json::json!({ "status": "error", "url": url, "error": e.to_string() }),
            };
            results.push(scraped);
        }
        Ok(serde_json::json!({ "results": results }))
    }
}

/// Decides whether the loop should stop after a turn, per §4.9 step 4's
/// five distinct conditions. Returns `None` to continue.
fn decide_stop_reason(tool_calls_this_turn: u32, turn: u32, tool_calls_total: u32, elapsed_ms: u64) -> Option<LoopStopReason> {
    if tool_calls_this_turn == 0 {
        return Some(LoopStopReason::NoToolCalls);
    }
    if turn >= MAX_AGENT_TURNS {
        return Some(LoopStopReason::MaxTurns);
    }
    if tool_calls_total >= MAX_AGENT_TOOL_CALLS_PER_RUN {
        return Some(LoopStopReason::ToolBudgetExhausted);
    }
    if tool_calls_this_turn >= MAX_AGENT_TOOL_CALLS_PER_TURN {
        return Some(LoopStopReason::PerTurnToolBudgetExhausted);
    }
    if elapsed_ms >= MAX_STREAM_DURATION_MS {
        return Some(LoopStopReason::WallTimeExceeded);
    }
    None
}

/// Deterministic idempotency key: `sha256(turn|toolName|canonicalInput)`
/// (§4.9), scoped to the run so two runs never collide on the same key.
fn idempotency_key(run_id: &RunId, turn: u32, tool_name: &str, canonical_input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(format!("{turn}|{tool_name}|{canonical_input}").as_bytes());
    let digest = hasher.finalize();
    format!("idem:{run_id}:{:x}", digest)
}

fn build_initial_prompt(user_request: &str, history: &[String]) -> String {
    let mut prompt = history.join("\n");
    if !prompt.is_empty() {
        prompt.push('\n');
    }
    prompt.push_str(user_request);
    prompt
}

/// Appends this turn's tool results to the running prompt, capping each
/// stdio stream, then the whole payload, then the whole prompt (§4.9
/// continuation prompt budget).
fn build_continuation_prompt(prompt: &str, executions: &[ToolExecutionRecord]) -> String {
    let mut continuation = String::from(prompt);
    for execution in executions {
        let payload = truncate_chars(&execution.output.to_string(), MAX_AGENT_TOOL_RESULT_PAYLOAD_CHARS);
        continuation.push_str(&format!("\n[tool:{}] {}", execution.name, payload));
    }
    truncate_chars(&continuation, MAX_AGENT_CONTINUATION_PROMPT_CHARS)
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(TRUNCATION_MARKER.chars().count());
    let truncated: String = s.chars().take(keep).collect();
    format!("{truncated}{TRUNCATION_MARKER}")
}

/// Matches `<file>` tag open/content/close triples out of a turn's parsed
/// events, respecting the parser's stack-by-path nesting (§4.8).
fn collect_finished_files(events: &[StreamEvent]) -> Vec<(String, String)> {
    let mut open: Vec<(String, String)> = Vec::new();
    let mut finished = Vec::new();
    for event in events {
        match event {
            StreamEvent::FileStart { path } => open.push((path.clone(), String::new())),
            StreamEvent::FileContent { path, content } => {
                if let Some(last) = open.last_mut() {
                    if &last.0 == path {
                        last.1.push_str(content);
                    }
                }
            }
            StreamEvent::FileEnd { path } => {
                if let Some(pos) = open.iter().rposition(|(p, _)| p == path) {
                    finished.push(open.remove(pos));
                }
            }
            _ => {}
        }
    }
    finished
}

fn extract_title(html: &str) -> Option<String> {
    let re = regex::Regex::new(r"(?is)<title[^>]*>(.*?)</title>").ok()?;
    re.captures(html).and_then(|c| c.get(1)).map(|m| m.as_str().trim().to_string())
}

fn strip_tags(html: &str) -> String {
    let re = match regex::Regex::new(r"(?is)<[^>]+>") {
        Ok(re) => re,
        Err(_) => return html.to_string(),
    };
    re.replace_all(html, " ").split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
#[path = "agent_loop_tests.rs"]
mod tests;
