use std::path::PathBuf;
use std::sync::mpsc;

use desk_core::{CacheStore, Effect, Failure, Msg};
use desk_engine::{EngineCommand, EngineEvent, EngineHandle, EventSink};
use desk_logging::{desk_debug, desk_error, desk_info};

use super::commands::Command;

/// Turns engine events into core messages on the event loop's channel.
pub struct MsgSink {
    tx: mpsc::Sender<Command>,
}

impl MsgSink {
    pub fn new(tx: mpsc::Sender<Command>) -> Self {
        Self { tx }
    }
}

impl EventSink for MsgSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(Command::Dispatch(to_msg(event)));
    }
}

pub(crate) fn to_msg(event: EngineEvent) -> Msg {
    match event {
        EngineEvent::CompleteTickets(result) => {
            Msg::CompleteTicketsLoaded(result.map_err(Failure::from))
        }
        EngineEvent::IncompleteTickets(result) => {
            Msg::IncompleteTicketsLoaded(result.map_err(Failure::from))
        }
        EngineEvent::SolutionsGenerated {
            token,
            ticket_key,
            result,
        } => Msg::SolutionsGenerated {
            token,
            ticket_key,
            result: result.map_err(Failure::from),
        },
        EngineEvent::SolutionPosted {
            token,
            ticket_key,
            result,
        } => Msg::SolutionSubmitted {
            token,
            ticket_key,
            result: result.map_err(Failure::from),
        },
        EngineEvent::UploadFinished { kind, result } => Msg::UploadFinished {
            kind,
            result: result.map_err(Failure::from),
        },
        EngineEvent::LogStream(event) => Msg::LogStream(event),
    }
}

/// Executes effects: network work goes to the engine, cache writes go to the store.
pub struct EffectRunner {
    engine: EngineHandle,
    store: Box<dyn CacheStore>,
}

impl EffectRunner {
    pub fn new(engine: EngineHandle, store: Box<dyn CacheStore>) -> Self {
        Self { engine, store }
    }

    pub fn start_log_stream(&self) {
        self.engine.start_log_stream();
    }

    pub fn run(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::PersistSolutionCache { blob } => {
                    desk_debug!("Persisting solution cache ({} bytes)", blob.len());
                    if let Err(err) = self.store.save(&blob) {
                        desk_error!("Failed to persist solution cache: {}", err);
                    }
                }
                other => {
                    if let Some(command) = to_command(other) {
                        self.engine.send(command);
                    }
                }
            }
        }
    }

    pub fn shutdown(&mut self) {
        desk_info!("Stopping engine");
        self.engine.shutdown();
    }
}

pub(crate) fn to_command(effect: Effect) -> Option<EngineCommand> {
    let command = match effect {
        Effect::FetchCompleteTickets => EngineCommand::FetchCompleteTickets,
        Effect::FetchIncompleteTickets => EngineCommand::FetchIncompleteTickets,
        Effect::GenerateSolutions { token, ticket_key } => {
            EngineCommand::GenerateSolutions { token, ticket_key }
        }
        Effect::SubmitSolution {
            token,
            ticket_key,
            solution_text,
            model,
        } => EngineCommand::SubmitSolution {
            token,
            ticket_key,
            solution_text,
            model,
        },
        Effect::UploadFile { kind, path } => EngineCommand::Upload {
            kind,
            path: PathBuf::from(path),
        },
        Effect::PersistSolutionCache { .. } => return None,
    };
    Some(command)
}
