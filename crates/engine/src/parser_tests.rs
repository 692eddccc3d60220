// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn plain_text_passes_through_unchanged() {
    let mut parser = StreamParser::new();
    let events = parser.process("hello world");
    assert_eq!(events, vec![StreamEvent::Text { content: "hello world".to_string() }]);
}

#[test]
fn thinking_tag_round_trips_in_one_chunk() {
    let mut parser = StreamParser::new();
    let events = parser.process("<Thinking>reasoning here</Thinking>");
    assert_eq!(
        events,
        vec![
            StreamEvent::ThinkingStart { content: None },
            StreamEvent::ThinkingContent { content: Some("reasoning here".to_string()) },
            StreamEvent::ThinkingEnd { content: None },
        ]
    );
}

#[test]
fn thinking_tag_split_across_chunks_is_not_misparsed() {
    let mut parser = StreamParser::new();
    let mut events = parser.process("<Thin");
    events.extend(parser.process("king>hello</Thinking>"));
    assert_eq!(
        events,
        vec![
            StreamEvent::ThinkingStart { content: None },
            StreamEvent::ThinkingContent { content: Some("hello".to_string()) },
            StreamEvent::ThinkingEnd { content: None },
        ]
    );
}

#[test]
fn sandbox_tag_carries_project_and_base_attributes() {
    let mut parser = StreamParser::new();
    let events = parser.process(r#"<edward_sandbox project="blog" base="next"></edward_sandbox>"#);
    assert_eq!(
        events,
        vec![
            StreamEvent::SandboxStart { project: Some("blog".to_string()), base: Some("next".to_string()) },
            StreamEvent::SandboxEnd { project: Some("blog".to_string()), base: Some("next".to_string()) },
        ]
    );
}

#[test]
fn file_tag_nested_in_sandbox_produces_nested_events() {
    let mut parser = StreamParser::new();
    let events =
        parser.process(r#"<edward_sandbox project="p" base="b"><file path="src/a.ts">content</file></edward_sandbox>"#);
    assert_eq!(
        events,
        vec![
            StreamEvent::SandboxStart { project: Some("p".to_string()), base: Some("b".to_string()) },
            StreamEvent::FileStart { path: "src/a.ts".to_string() },
            StreamEvent::FileContent { path: "src/a.ts".to_string(), content: "content".to_string() },
            StreamEvent::FileEnd { path: "src/a.ts".to_string() },
            StreamEvent::SandboxEnd { project: Some("p".to_string()), base: Some("b".to_string()) },
        ]
    );
}

#[test]
fn file_path_strips_dot_dot_segments() {
    let mut parser = StreamParser::new();
    let events = parser.process(r#"<file path="../../etc/passwd">x</file>"#);
    assert!(events.iter().any(|e| matches!(e, StreamEvent::FileStart { path } if path == "etc/passwd")));
}

#[test]
fn file_path_that_normalizes_to_empty_emits_error() {
    let mut parser = StreamParser::new();
    let events = parser.process(r#"<file path="../..">x</file>"#);
    assert!(matches!(events.first(), Some(StreamEvent::Error { .. })));
}

#[test]
fn flush_closes_open_tags_in_stack_order() {
    let mut parser = StreamParser::new();
    let mut events = parser.process(r#"<edward_sandbox project="p" base="b"><file path="a.ts">partial"#);
    events.extend(parser.flush());
    assert_eq!(events[events.len() - 3], StreamEvent::FileContent { path: "a.ts".to_string(), content: "partial".to_string() });
    assert_eq!(events[events.len() - 2], StreamEvent::FileEnd { path: "a.ts".to_string() });
    assert!(matches!(events.last(), Some(StreamEvent::SandboxEnd { .. })));
}

#[test]
fn runaway_loop_triggers_iteration_guard_and_resets() {
    let mut parser = StreamParser::new();
    let garbage: String = std::iter::repeat('<').take(2000).collect();
    let events = parser.process(&garbage);
    assert!(events.iter().any(|e| matches!(e, StreamEvent::Error { message } if message.contains("iteration guard"))));
    assert!(parser.buffer.is_empty());
    assert!(parser.stack.is_empty());
}

#[test]
fn buffer_cap_evicts_oldest_bytes_as_a_backstop() {
    let mut parser = StreamParser::new();
    parser.buffer = "x".repeat(MAX_BUFFER_BYTES + 500);
    let _ = parser.process("");
    assert!(parser.buffer.len() <= MAX_BUFFER_BYTES);
}
