use desk_core::{
    update, AppState, Effect, FailureKind, LogStreamEvent, Msg, NoticeLevel, CONNECTED_MARKER,
    LOG_CAPACITY,
};

fn feed(state: AppState, event: LogStreamEvent) -> (AppState, Vec<Effect>) {
    update(state, Msg::LogStream(event))
}

#[test]
fn buffer_is_bounded_and_newest_first() {
    let (mut state, _) = feed(AppState::new(), LogStreamEvent::Connected);
    for i in 0..250 {
        let (next, effects) = feed(state, LogStreamEvent::Line(format!("poll line {i}")));
        assert!(effects.is_empty());
        assert!(next.logs().len() <= LOG_CAPACITY);
        state = next;
    }

    let logs = state.view().logs;
    assert_eq!(logs.len(), LOG_CAPACITY);
    assert_eq!(logs[0], "poll line 249");
    assert_eq!(logs[LOG_CAPACITY - 1], "poll line 150");
    assert!(!logs.iter().any(|line| line == CONNECTED_MARKER));
}

#[test]
fn markers_are_prepended_on_connect_and_disconnect() {
    let (state, effects) = feed(AppState::new(), LogStreamEvent::Connected);
    assert!(effects.is_empty());
    assert!(state.view().stream_connected);

    let (state, _) = feed(state, LogStreamEvent::Line("Found 2 tickets".to_string()));
    let (state, effects) = feed(
        state,
        LogStreamEvent::Disconnected {
            attempt: 1,
            retry_in_ms: 1_000,
            reason: "connection reset".to_string(),
        },
    );
    assert!(effects.is_empty());

    let failure = state.stream_failure().expect("stream failure recorded");
    assert_eq!(failure.kind, FailureKind::Stream);
    assert_eq!(failure.message, "connection reset");

    let view = state.view();
    assert!(!view.stream_connected);
    assert_eq!(
        view.stream_error.as_deref(),
        Some("stream failure: connection reset")
    );
    assert!(view.notices.is_empty());
    assert_eq!(
        view.logs,
        vec![
            "[log stream disconnected: connection reset; retrying in 1.0s (attempt 1)]"
                .to_string(),
            "Found 2 tickets".to_string(),
            CONNECTED_MARKER.to_string(),
        ]
    );
}

#[test]
fn reconnect_after_loss_refreshes_ticket_lists() {
    let (state, _) = feed(AppState::new(), LogStreamEvent::Connected);
    let (state, _) = feed(
        state,
        LogStreamEvent::Disconnected {
            attempt: 1,
            retry_in_ms: 2_000,
            reason: String::new(),
        },
    );

    assert_eq!(
        state.stream_failure().map(|f| f.message.as_str()),
        Some("connection closed")
    );

    let (state, effects) = feed(state, LogStreamEvent::Connected);

    assert_eq!(
        effects,
        vec![Effect::FetchIncompleteTickets, Effect::FetchCompleteTickets]
    );
    let view = state.view();
    assert_eq!(
        view.logs[1],
        "[log stream disconnected, retrying in 2.0s (attempt 1)]"
    );
    assert!(state.stream_failure().is_none());
    assert_eq!(view.stream_error, None);
    assert_eq!(view.notices.len(), 1);
    assert_eq!(view.notices[0].level, NoticeLevel::Info);
    assert_eq!(view.notices[0].text, "Log stream reconnected; refreshing tickets");
}

#[test]
fn first_connect_posts_no_notice() {
    let (state, effects) = feed(AppState::new(), LogStreamEvent::Connected);
    assert!(effects.is_empty());
    assert!(state.view().notices.is_empty());
    assert!(state.stream_failure().is_none());
}
