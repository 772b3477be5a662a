use desk_core::{update, AppState, Effect, Failure, IncompleteSnapshot, IncompleteTicket, Msg};

const NOW: i64 = 1_790_000_000_000;

fn eta_loaded(state: AppState, eta: i64) -> AppState {
    let snapshot = IncompleteSnapshot {
        tickets: vec![IncompleteTicket {
            key: "ERP-11".to_string(),
            module: "GL.Journal".to_string(),
            missing_fields: vec!["Ledger".to_string(), "Period".to_string()],
            validated_at: Some("2026-10-01T08:00:00Z".to_string()),
            model: "gemini-1.5-flash".to_string(),
        }],
        next_poll_eta: Some(eta),
    };
    let (state, _) = update(state, Msg::IncompleteTicketsLoaded(Ok(snapshot)));
    state
}

fn tick(state: AppState, now_ms: i64) -> (AppState, Vec<Effect>) {
    update(state, Msg::Tick { now_ms })
}

fn is_refresh(effects: &[Effect]) -> bool {
    effects.contains(&Effect::FetchIncompleteTickets)
}

#[test]
fn countdown_is_unknown_until_server_declares_eta() {
    let (state, effects) = tick(AppState::new(), NOW);

    assert!(effects.is_empty());
    assert_eq!(state.view().countdown, "--:--");
}

#[test]
fn countdown_formats_remaining_time() {
    let state = eta_loaded(AppState::new(), NOW + 65_000);

    let (state, _) = tick(state, NOW + 1_000);
    assert_eq!(state.view().countdown, "01:04");

    let (state, _) = tick(state, NOW + 64_500);
    assert_eq!(state.view().countdown, "00:01");
}

#[test]
fn countdown_never_goes_negative() {
    let state = eta_loaded(AppState::new(), NOW + 2_000);

    let (state, _) = tick(state, NOW + 10_000);
    assert_eq!(state.view().countdown, "00:00");

    let (state, _) = tick(state, NOW + 600_000);
    assert_eq!(state.view().countdown, "00:00");
}

#[test]
fn one_refresh_at_boundary_then_countdown_resets() {
    let mut state = eta_loaded(AppState::new(), NOW + 65_000);
    let mut refreshes = Vec::new();

    for second in 1..=70 {
        let now = NOW + second * 1_000;
        let (next, effects) = tick(state, now);
        if is_refresh(&effects) {
            refreshes.push(second);
            assert_eq!(
                effects,
                vec![Effect::FetchIncompleteTickets, Effect::FetchCompleteTickets]
            );
        }
        state = next;
    }
    assert_eq!(refreshes, vec![65]);

    let state = eta_loaded(state, NOW + 65_000 + 300_000);
    let (state, effects) = tick(state, NOW + 71_000);
    assert!(effects.is_empty());
    assert_eq!(state.view().countdown, "04:54");
}

#[test]
fn overlapping_ticks_at_boundary_fire_once() {
    let state = eta_loaded(AppState::new(), NOW + 5_000);

    let (state, first) = tick(state, NOW + 5_000);
    let (state, second) = tick(state, NOW + 5_000);
    let (_state, third) = tick(state, NOW + 5_400);

    assert!(is_refresh(&first));
    assert!(second.is_empty());
    assert!(third.is_empty());
}

#[test]
fn failed_refetch_does_not_retry_automatically() {
    let state = eta_loaded(AppState::new(), NOW + 1_000);
    let (state, effects) = tick(state, NOW + 1_000);
    assert!(is_refresh(&effects));

    let (state, _) = update(
        state,
        Msg::IncompleteTicketsLoaded(Err(Failure::network("http status 500"))),
    );
    let (state, effects) = tick(state, NOW + 2_000);
    assert!(effects.is_empty());

    // History from the earlier fetch is kept.
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.poll().eta_ms(), Some(NOW + 1_000));

    let (_state, effects) = update(state, Msg::RefreshClicked);
    assert!(is_refresh(&effects));
}

#[test]
fn repeated_eta_does_not_rearm() {
    let state = eta_loaded(AppState::new(), NOW + 1_000);
    let (state, effects) = tick(state, NOW + 1_000);
    assert!(is_refresh(&effects));

    let state = eta_loaded(state, NOW + 1_000);
    let (_state, effects) = tick(state, NOW + 2_000);
    assert!(effects.is_empty());
}

#[test]
fn refresh_skips_fetches_already_in_flight() {
    let (state, effects) = update(AppState::new(), Msg::RefreshClicked);
    assert_eq!(effects.len(), 2);

    let (_state, effects) = update(state, Msg::RefreshClicked);
    assert!(effects.is_empty());
}
