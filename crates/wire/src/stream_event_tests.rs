// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn meta_frame_uses_camel_case_fields_on_the_wire() {
    let event = StreamEvent::Meta {
        chat_id: "chat-1".into(),
        user_message_id: "msg-1".into(),
        assistant_message_id: "msg-2".into(),
        is_new_chat: true,
        run_id: RunId::new(),
        phase: MetaPhase::SessionStart,
        loop_stop_reason: None,
        termination_reason: None,
    };
    let json = serde_json::to_value(&event).unwrap();
    assert_eq!(json["type"], "meta");
    assert_eq!(json["chatId"], "chat-1");
    assert_eq!(json["isNewChat"], true);
    assert!(json.get("loopStopReason").is_none());
}

#[test]
fn command_frame_round_trips() {
    let event = StreamEvent::Command {
        command: "npm".into(),
        args: vec!["install".into()],
        stdout: Some("added 3 packages".into()),
        stderr: None,
        exit_code: Some(0),
    };
    let json = serde_json::to_string(&event).unwrap();
    let back: StreamEvent = serde_json::from_str(&json).unwrap();
    assert_eq!(event, back);
}

#[test]
fn event_type_matches_wire_tag_for_every_variant() {
    let build_status_event = StreamEvent::BuildStatus {
        chat_id: "chat-1".into(),
        status: BuildStatus::Building,
        build_id: edw_core::build::BuildId::new(),
        preview_url: None,
        error_log: None,
    };
    assert_eq!(build_status_event.event_type(), "build_status");
    let json = serde_json::to_value(&build_status_event).unwrap();
    assert_eq!(json["type"], build_status_event.event_type());
}

#[test]
fn only_session_complete_meta_is_terminal() {
    let start = StreamEvent::Meta {
        chat_id: "c".into(),
        user_message_id: "u".into(),
        assistant_message_id: "a".into(),
        is_new_chat: false,
        run_id: RunId::new(),
        phase: MetaPhase::SessionStart,
        loop_stop_reason: None,
        termination_reason: None,
    };
    assert!(!start.is_session_complete());

    let complete = StreamEvent::Meta {
        chat_id: "c".into(),
        user_message_id: "u".into(),
        assistant_message_id: "a".into(),
        is_new_chat: false,
        run_id: RunId::new(),
        phase: MetaPhase::SessionComplete,
        loop_stop_reason: None,
        termination_reason: Some(TerminationReason::Completed),
    };
    assert!(complete.is_session_complete());

    assert!(!StreamEvent::Text { content: "hi".into() }.is_session_complete());
}
