use desk_logging::{desk_debug, desk_info};

use crate::{
    AppState, Effect, Failure, GenerateOutcome, GenerateRequest, LogStreamEvent, Msg,
    NoticeLevel, RequestToken, Solution, SubmitOutcome, SubmitRequest,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::Started => state.begin_refresh(),
        Msg::Tick { now_ms } => {
            let outcome = state.poll_mut().tick(now_ms);
            if outcome.countdown_changed {
                state.mark_dirty();
            }
            if outcome.refresh_due {
                desk_info!("Poll eta reached; refreshing ticket lists");
                state.begin_refresh()
            } else {
                Vec::new()
            }
        }
        Msg::RefreshClicked => {
            state.clear_inline_error();
            state.begin_refresh()
        }
        Msg::TicketSelected(key) => {
            state.clear_inline_error();
            select_ticket(&mut state, key)
        }
        Msg::RegenerateClicked => {
            state.clear_inline_error();
            match state.lifecycle_mut().regenerate() {
                Some(request) => {
                    state.mark_dirty();
                    vec![generate_effect(request)]
                }
                None => Vec::new(),
            }
        }
        Msg::SolutionChosen(index) => {
            state.clear_inline_error();
            if state.lifecycle_mut().review(index) {
                state.mark_dirty();
            } else {
                state.set_inline_error(Failure::validation(format!(
                    "no solution #{} to review",
                    index + 1
                )));
            }
            Vec::new()
        }
        Msg::WorkingCopyEdited(text) => {
            state.clear_inline_error();
            if state.lifecycle_mut().edit(text) {
                state.mark_dirty();
            } else {
                state.set_inline_error(Failure::validation("no solution is under review"));
            }
            Vec::new()
        }
        Msg::ReviewDiscarded => {
            state.clear_inline_error();
            if state.lifecycle_mut().discard_review() {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::SubmitClicked => {
            state.clear_inline_error();
            match state.lifecycle_mut().submit() {
                Some(request) => {
                    state.mark_dirty();
                    vec![submit_effect(request)]
                }
                None => {
                    if !state.lifecycle().is_busy() {
                        state.set_inline_error(Failure::validation(
                            "select a ticket and review a solution before submitting",
                        ));
                    }
                    Vec::new()
                }
            }
        }
        Msg::UploadRequested { kind, path } => {
            state.clear_inline_error();
            let path = path
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty());
            match path {
                None => {
                    state.set_inline_error(Failure::validation(format!(
                        "choose a file before uploading {}",
                        kind.label()
                    )));
                    Vec::new()
                }
                Some(_) if state.upload(kind).busy => Vec::new(),
                Some(path) => {
                    state.upload_mut(kind).busy = true;
                    state.mark_dirty();
                    vec![Effect::UploadFile { kind, path }]
                }
            }
        }
        Msg::NoticeDismissed(id) => {
            state.dismiss_notice(id);
            Vec::new()
        }
        Msg::CompleteTicketsLoaded(result) => {
            match result {
                Ok(tickets) => state.replace_queue(tickets),
                Err(failure) => {
                    state.complete_fetch_failed();
                    state.notify(
                        NoticeLevel::Error,
                        format!("Could not load ticket queue: {}", failure.message),
                    );
                }
            }
            Vec::new()
        }
        Msg::IncompleteTicketsLoaded(result) => {
            match result {
                Ok(snapshot) => {
                    state.replace_history(snapshot.tickets);
                    if let Some(eta) = snapshot.next_poll_eta {
                        if state.poll_mut().on_eta(eta) {
                            desk_debug!("Next poll eta set to {}", eta);
                        }
                    }
                }
                Err(failure) => {
                    state.incomplete_fetch_failed();
                    state.notify(
                        NoticeLevel::Error,
                        format!("Could not load incomplete tickets: {}", failure.message),
                    );
                }
            }
            Vec::new()
        }
        Msg::SolutionsGenerated {
            token,
            ticket_key,
            result,
        } => solutions_generated(&mut state, token, ticket_key, result),
        Msg::SolutionSubmitted {
            token,
            ticket_key,
            result,
        } => solution_submitted(&mut state, token, ticket_key, result),
        Msg::UploadFinished { kind, result } => {
            state.upload_mut(kind).busy = false;
            match result {
                Ok(message) => {
                    state.upload_mut(kind).last_message = Some(message.clone());
                    state.notify(NoticeLevel::Success, message);
                }
                Err(failure) => {
                    state.notify(
                        NoticeLevel::Error,
                        format!("Uploading {} failed: {}", kind.label(), failure.message),
                    );
                }
            }
            Vec::new()
        }
        Msg::LogStream(event) => {
            state.logs_mut().apply(&event);
            state.mark_dirty();
            match event {
                LogStreamEvent::Connected => {
                    if state.stream_connected() {
                        desk_info!("Log stream reconnected; refreshing ticket lists");
                        state.notify(
                            NoticeLevel::Info,
                            "Log stream reconnected; refreshing tickets",
                        );
                        state.begin_refresh()
                    } else {
                        Vec::new()
                    }
                }
                LogStreamEvent::Disconnected { reason, .. } => {
                    let reason = if reason.is_empty() {
                        "connection closed".to_string()
                    } else {
                        reason
                    };
                    state.stream_lost(Failure::stream(reason));
                    Vec::new()
                }
                LogStreamEvent::Line(_) => Vec::new(),
            }
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn select_ticket(state: &mut AppState, key: Option<String>) -> Vec<Effect> {
    let key = key
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty());
    if key.as_deref() == state.lifecycle().selected() {
        return Vec::new();
    }
    if let Some(k) = key.as_deref() {
        if !state.is_queued(k) {
            state.set_inline_error(Failure::validation(format!("{k} is not in the queue")));
            return Vec::new();
        }
    }

    let (lifecycle, cache) = state.lifecycle_and_cache();
    let request = lifecycle.select(key, cache);
    state.mark_dirty();
    request.map(generate_effect).into_iter().collect()
}

fn solutions_generated(
    state: &mut AppState,
    token: RequestToken,
    ticket_key: String,
    result: Result<Vec<Solution>, Failure>,
) -> Vec<Effect> {
    let (lifecycle, cache) = state.lifecycle_and_cache();
    let outcome = lifecycle.solutions_generated(token, &ticket_key, result, cache);
    match outcome {
        GenerateOutcome::Applied(solutions) => {
            state.mark_dirty();
            cache_solutions(state, ticket_key, solutions)
        }
        GenerateOutcome::Failed(failure) => {
            state.notify(
                NoticeLevel::Error,
                format!(
                    "Generating solutions for {ticket_key} failed: {}",
                    failure.message
                ),
            );
            Vec::new()
        }
        GenerateOutcome::Stale(Ok(solutions)) => {
            desk_debug!(
                "Late solutions for {} (token {}) cached without changing the selection",
                ticket_key,
                token
            );
            cache_solutions(state, ticket_key, solutions)
        }
        GenerateOutcome::Stale(Err(failure)) => {
            desk_debug!(
                "Dropping late generate failure for {} (token {}): {}",
                ticket_key,
                token,
                failure
            );
            Vec::new()
        }
    }
}

/// Caches a generated list while its ticket is still queued.
fn cache_solutions(
    state: &mut AppState,
    ticket_key: String,
    solutions: Vec<Solution>,
) -> Vec<Effect> {
    if !state.is_queued(&ticket_key) {
        desk_debug!("{} left the queue; not caching its solutions", ticket_key);
        return Vec::new();
    }
    state.cache_mut().put(ticket_key, solutions);
    state.mark_dirty();
    state.persist_cache().into_iter().collect()
}

fn solution_submitted(
    state: &mut AppState,
    token: RequestToken,
    ticket_key: String,
    result: Result<(), Failure>,
) -> Vec<Effect> {
    let outcome = state
        .lifecycle_mut()
        .solution_submitted(token, &ticket_key, result);
    match outcome {
        SubmitOutcome::Resolved | SubmitOutcome::StaleResolved => {
            desk_info!("Solution for {} posted; resolving ticket", ticket_key);
            let evicted = state.resolve_ticket(&ticket_key);
            state.notify(
                NoticeLevel::Success,
                format!("Solution posted to {ticket_key}"),
            );
            if evicted {
                state.persist_cache().into_iter().collect()
            } else {
                Vec::new()
            }
        }
        SubmitOutcome::Failed(failure) => {
            state.notify(
                NoticeLevel::Error,
                format!("Submitting {ticket_key} failed: {}", failure.message),
            );
            Vec::new()
        }
        SubmitOutcome::StaleFailed(failure) => {
            state.notify(
                NoticeLevel::Error,
                format!(
                    "Submitting {ticket_key} failed after the selection changed: {}",
                    failure.message
                ),
            );
            Vec::new()
        }
    }
}

fn generate_effect(request: GenerateRequest) -> Effect {
    Effect::GenerateSolutions {
        token: request.token,
        ticket_key: request.ticket_key,
    }
}

fn submit_effect(request: SubmitRequest) -> Effect {
    Effect::SubmitSolution {
        token: request.token,
        ticket_key: request.ticket_key,
        solution_text: request.solution_text,
        model: request.model,
    }
}
