use desk_core::{update, AppState, Msg};

#[test]
fn update_is_noop() {
    let state = AppState::new();
    let (next, effects) = update(state.clone(), Msg::NoOp);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn started_fetches_both_ticket_lists() {
    let (mut state, effects) = update(AppState::new(), Msg::Started);

    assert_eq!(
        effects,
        vec![
            desk_core::Effect::FetchIncompleteTickets,
            desk_core::Effect::FetchCompleteTickets,
        ]
    );
    assert!(state.view().refreshing);
    assert!(state.consume_dirty());
}
