use openai_api::{ChatStreamEvent, SseStreamParser};

#[test]
fn tool_call_deltas_keep_index_and_fragment_order() {
    let frames = concat!(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"id\":\"call_1\",\"function\":{\"name\":\"edit_file\",\"arguments\":\"\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"tool_calls\":[{\"index\":0,\"function\":{\"arguments\":\"{\\\"file\"}}]}}]}\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{},\"finish_reason\":\"tool_calls\"}]}\n\n",
        "data: [DONE]\n\n",
    );

    let events = SseStreamParser::parse_frames(frames);

    assert_eq!(
        events,
        vec![
            ChatStreamEvent::ToolCallDelta {
                index: 0,
                id: Some("call_1".to_string()),
                name: Some("edit_file".to_string()),
                arguments: Some(String::new()),
            },
            ChatStreamEvent::ToolCallDelta {
                index: 0,
                id: None,
                name: None,
                arguments: Some("{\"file".to_string()),
            },
            ChatStreamEvent::Finished {
                reason: "tool_calls".to_string(),
            },
            ChatStreamEvent::Done,
        ]
    );
}

#[test]
fn choices_other_than_the_first_are_ignored() {
    let frames = concat!(
        "data: {\"choices\":[{\"index\":1,\"delta\":{\"content\":\"other\"}},",
        "{\"index\":0,\"delta\":{\"content\":\"main\"}}]}\n\n",
    );

    assert_eq!(
        SseStreamParser::parse_frames(frames),
        vec![ChatStreamEvent::TextDelta {
            delta: "main".to_string()
        }]
    );
}

#[test]
fn comments_and_malformed_frames_are_skipped() {
    let frames = concat!(
        ": keep-alive\n\n",
        "data: {not json}\n\n",
        "event: ping\n\n",
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"ok\"}}]}\n\n",
    );

    assert_eq!(
        SseStreamParser::parse_frames(frames),
        vec![ChatStreamEvent::TextDelta {
            delta: "ok".to_string()
        }]
    );
}

#[test]
fn in_band_error_object_becomes_error_event() {
    let frames = "data: {\"error\":{\"message\":\"rate limited\",\"code\":\"rate_limit_exceeded\"}}\n\n";

    assert_eq!(
        SseStreamParser::parse_frames(frames),
        vec![ChatStreamEvent::Error {
            code: Some("rate_limit_exceeded".to_string()),
            message: Some("rate limited".to_string()),
        }]
    );
}

#[test]
fn partial_frame_waits_for_terminator() {
    let mut parser = SseStreamParser::default();

    assert!(parser
        .feed(b"data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"x\"}}]}\n")
        .is_empty());
    assert!(!parser.is_empty_buffer());
    assert_eq!(parser.feed(b"\n").len(), 1);
}

#[test]
fn stream_event_variant_names_stable() {
    let delta = ChatStreamEvent::TextDelta {
        delta: "hello".to_string(),
    };
    let value = serde_json::to_value(&delta).expect("serialize text delta");
    assert_eq!(value["type"], "text_delta");
    assert_eq!(value["delta"], "hello");

    let value = serde_json::to_value(ChatStreamEvent::Done).expect("serialize done");
    assert_eq!(value["type"], "done");
}

#[test]
fn done_and_error_events_are_terminal() {
    let events = SseStreamParser::parse_frames(concat!(
        "data: {\"choices\":[{\"index\":0,\"delta\":{\"content\":\"hi\"}}]}\n\n",
        "data: {\"error\":{\"message\":\"overloaded\"}}\n\n",
        "data: [DONE]\n\n",
    ));

    let terminal: Vec<bool> = events.iter().map(ChatStreamEvent::is_terminal).collect();
    assert_eq!(terminal, vec![false, true, true]);
}
