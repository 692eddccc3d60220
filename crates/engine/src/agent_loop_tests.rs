// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::llm::{fake::FakeLlmClient, TurnOutput};
use edw_container::driver::fake::FakeContainerDriver;
use edw_core::clock::FakeClock;
use edw_core::sandbox::{ChatId, SandboxId, UserId};
use edw_storage::kv::fake::FakeKvStore;

fn make_loop(llm: FakeLlmClient) -> (AgentLoop<FakeClock>, Arc<FakeContainerDriver>) {
    let kv: Arc<dyn KvStore> = Arc::new(FakeKvStore::new());
    let limiter = Arc::new(SlotLimiter::new(kv.clone(), 10));
    let run_log = Arc::new(RunEventLog::new(kv.clone()));
    let container = Arc::new(FakeContainerDriver::new());
    let agent_loop = AgentLoop::new(limiter, run_log, container.clone(), Arc::new(llm), kv, FakeClock::new());
    (agent_loop, container)
}

fn make_ctx(container_id: &str) -> RunContext {
    RunContext {
        run_id: RunId::new(),
        user_id: UserId::new("user-1"),
        chat_id: ChatId::new("chat-1"),
        sandbox_id: SandboxId::new(),
        container: ContainerHandle { id: container_id.to_string() },
        workdir: "/home/node/edward".to_string(),
        api_key: "test-key".to_string(),
        model: "test-model".to_string(),
    }
}

#[tokio::test]
async fn stops_with_no_tool_calls_when_assistant_emits_only_text() {
    let llm = FakeLlmClient::new(vec![TurnOutput { chunks: vec!["all done".to_string()], tool_calls: vec![] }]);
    let (agent_loop, _container) = make_loop(llm);
    let ctx = make_ctx("c1");
    let outcome = agent_loop.run(&ctx, "do the thing", &[], &CancellationToken::new()).await;
    assert_eq!(outcome.stop_reason, LoopStopReason::NoToolCalls);
    assert_eq!(outcome.termination_reason, TerminationReason::Completed);
    assert_eq!(outcome.turns, 1);
    assert_eq!(outcome.tool_calls_total, 0);
}

#[tokio::test]
async fn stops_at_max_turns_when_tools_keep_coming() {
    let turn = TurnOutput {
        chunks: vec!["working".to_string()],
        tool_calls: vec![ToolCallRequest { name: "command".to_string(), input: serde_json::json!({ "command": "ls", "args": [] }) }],
    };
    let llm = FakeLlmClient::new(vec![turn]);
    let (agent_loop, _container) = make_loop(llm);
    let ctx = make_ctx("c2");
    let outcome = agent_loop.run(&ctx, "keep going", &[], &CancellationToken::new()).await;
    assert_eq!(outcome.stop_reason, LoopStopReason::MaxTurns);
    assert_eq!(outcome.turns, MAX_AGENT_TURNS);
    assert_eq!(outcome.tool_calls_total, MAX_AGENT_TURNS);
}

#[tokio::test]
async fn stops_when_per_turn_tool_budget_exhausted() {
    let tool_calls = (0..MAX_AGENT_TOOL_CALLS_PER_TURN)
        .map(|i| ToolCallRequest { name: "command".to_string(), input: serde_json::json!({ "command": "ls", "args": [i.to_string()] }) })
        .collect();
    let llm = FakeLlmClient::new(vec![TurnOutput { chunks: vec![], tool_calls }]);
    let (agent_loop, _container) = make_loop(llm);
    let ctx = make_ctx("c3");
    let outcome = agent_loop.run(&ctx, "burst", &[], &CancellationToken::new()).await;
    assert_eq!(outcome.stop_reason, LoopStopReason::PerTurnToolBudgetExhausted);
    assert_eq!(outcome.turns, 1);
}

#[tokio::test]
async fn stops_immediately_when_cancelled_before_first_turn() {
    let llm = FakeLlmClient::new(vec![TurnOutput { chunks: vec!["x".to_string()], tool_calls: vec![] }]);
    let (agent_loop, _container) = make_loop(llm);
    let ctx = make_ctx("c4");
    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = agent_loop.run(&ctx, "go", &[], &cancel).await;
    assert_eq!(outcome.stop_reason, LoopStopReason::Cancelled);
    assert_eq!(outcome.termination_reason, TerminationReason::Cancelled);
    assert_eq!(outcome.turns, 0);
}

#[tokio::test]
async fn command_tool_call_executes_through_gateway_and_container() {
    let llm = FakeLlmClient::new(vec![TurnOutput {
        chunks: vec![],
        tool_calls: vec![ToolCallRequest { name: "command".to_string(), input: serde_json::json!({ "command": "ls", "args": ["-la"] }) }],
    }]);
    let (agent_loop, container) = make_loop(llm);
    let ctx = make_ctx("c5");
    let _ = agent_loop.run(&ctx, "list files", &[], &CancellationToken::new()).await;
    assert!(container.calls.lock().iter().any(|c| c.contains("exec:c5") && c.contains("ls -la")));
}

#[tokio::test]
async fn disallowed_command_is_recorded_as_a_failed_tool_execution_not_a_panic() {
    let llm = FakeLlmClient::new(vec![TurnOutput {
        chunks: vec![],
        tool_calls: vec![ToolCallRequest { name: "command".to_string(), input: serde_json::json!({ "command": "chmod", "args": ["777", "/"] }) }],
    }]);
    let (agent_loop, _container) = make_loop(llm);
    let ctx = make_ctx("c6");
    let outcome = agent_loop.run(&ctx, "chmod it", &[], &CancellationToken::new()).await;
    // the disallowed call still counts as a tool call this turn, so the
    // loop behaves as though a (failed) tool ran rather than stopping
    // with NoToolCalls — it keeps turning until MaxTurns, never panicking.
    assert_eq!(outcome.stop_reason, LoopStopReason::MaxTurns);
    assert_eq!(outcome.tool_calls_total, MAX_AGENT_TURNS);
}

#[tokio::test]
async fn file_tag_in_turn_text_is_written_to_the_sandbox() {
    let llm = FakeLlmClient::new(vec![TurnOutput {
        chunks: vec![r#"<file path="src/a.ts">export const x = 1;</file>"#.to_string()],
        tool_calls: vec![],
    }]);
    let (agent_loop, container) = make_loop(llm);
    let ctx = make_ctx("c7");
    let outcome = agent_loop.run(&ctx, "write a file", &[], &CancellationToken::new()).await;
    assert_eq!(outcome.stop_reason, LoopStopReason::MaxTurns);
    assert!(container.calls.lock().iter().any(|c| c.starts_with("put_archive:c7")));
}

#[tokio::test]
async fn repeated_idempotency_key_reuses_cached_output_without_redispatch() {
    let llm = FakeLlmClient::new(vec![TurnOutput { chunks: vec![], tool_calls: vec![] }]);
    let (agent_loop, container) = make_loop(llm);
    let ctx = make_ctx("c8");
    let input = serde_json::json!({ "command": "ls", "args": [] });

    let key = idempotency_key(&ctx.run_id, 1, "command", &input.to_string());
    agent_loop.idempotency.set_with_ttl(&key, &serde_json::json!({ "cached": true }).to_string(), Duration::from_secs(60)).await.unwrap();

    let output = agent_loop.execute_with_idempotency(&ctx, 1, "command", input).await.unwrap();
    assert_eq!(output, serde_json::json!({ "cached": true }));
    assert!(container.calls.lock().is_empty(), "cached tool output must not re-dispatch to the container");
}

#[test]
fn decide_stop_reason_prioritizes_no_tool_calls() {
    assert_eq!(decide_stop_reason(0, 1, 0, 0), Some(LoopStopReason::NoToolCalls));
}

#[test]
fn decide_stop_reason_reports_tool_budget_before_wall_time() {
    assert_eq!(decide_stop_reason(1, 2, MAX_AGENT_TOOL_CALLS_PER_RUN, MAX_STREAM_DURATION_MS), Some(LoopStopReason::ToolBudgetExhausted));
}

#[test]
fn decide_stop_reason_continues_under_every_cap() {
    assert_eq!(decide_stop_reason(1, 1, 1, 0), None);
}

#[test]
fn truncate_chars_appends_marker_only_when_over_budget() {
    assert_eq!(truncate_chars("short", 100), "short");
    let long = "x".repeat(50);
    let truncated = truncate_chars(&long, 10);
    assert!(truncated.ends_with(TRUNCATION_MARKER));
    assert!(truncated.chars().count() <= 10);
}

#[test]
fn idempotency_key_is_stable_for_identical_inputs_and_differs_on_turn() {
    let run_id = RunId::new();
    let a = idempotency_key(&run_id, 1, "command", "{}");
    let b = idempotency_key(&run_id, 1, "command", "{}");
    let c = idempotency_key(&run_id, 2, "command", "{}");
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn collect_finished_files_pairs_nested_file_tags_by_path() {
    let events = vec![
        StreamEvent::FileStart { path: "a.ts".to_string() },
        StreamEvent::FileContent { path: "a.ts".to_string(), content: "part1".to_string() },
        StreamEvent::FileContent { path: "a.ts".to_string(), content: "part2".to_string() },
        StreamEvent::FileEnd { path: "a.ts".to_string() },
    ];
    let finished = collect_finished_files(&events);
    assert_eq!(finished, vec![("a.ts".to_string(), "part1part2".to_string())]);
}
