use std::io::{self, BufRead, Write};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Utc;
use desk_core::{update, AppState, CacheStore, MemoryCacheStore, Msg, SolutionCache, POLL_TICK_MS};
use desk_engine::{ensure_state_dir, EngineHandle};
use desk_logging::{desk_debug, desk_info, desk_warn, set_loop_turn};

use super::commands::{self, Command, Section};
use super::config::{Cli, DeskConfig};
use super::effects::{EffectRunner, MsgSink};
use super::logging;
use super::persistence::FileCacheStore;
use super::ui::render::{render_logs, render_tickets, Screen};

pub fn run_app(cli: Cli) -> anyhow::Result<()> {
    let config = DeskConfig::load(&cli.config)?.with_overrides(&cli);
    config.validate()?;
    logging::initialize(config.log_destination, config.log_level);
    desk_info!(
        "desk v{} starting against {}",
        env!("CARGO_PKG_VERSION"),
        config.api_base_url
    );

    let store = open_store(&config, cli.ephemeral);
    let cache = SolutionCache::restore(store.as_ref());

    let (tx, rx) = mpsc::channel::<Command>();
    let engine = EngineHandle::new(config.engine_settings(), Arc::new(MsgSink::new(tx.clone())))
        .context("starting engine")?;
    let mut runner = EffectRunner::new(engine, store);
    spawn_stdin_reader(tx);

    println!("{}", commands::HELP);
    let mut event_loop = EventLoop {
        state: AppState::with_cache(cache),
        screen: Screen::new(),
        turn: 0,
    };
    runner.start_log_stream();
    event_loop.dispatch(Msg::Started, &runner);

    let tick = Duration::from_millis(POLL_TICK_MS);
    let mut next_tick = Instant::now() + tick;
    while let Some(command) = next_command(&rx, &mut next_tick, tick) {
        match command {
            Command::Dispatch(msg) => event_loop.dispatch(msg, &runner),
            Command::Show(section) => event_loop.show(section),
            Command::Help => println!("{}", commands::HELP),
            Command::Quit => break,
        }
    }

    runner.shutdown();
    desk_info!("desk stopped");
    Ok(())
}

/// Waits for the next command. A due tick is dispatched before anything
/// queued, so a busy inbox cannot starve the poll countdown.
/// `None` once every sender is gone.
fn next_command(
    rx: &mpsc::Receiver<Command>,
    next_tick: &mut Instant,
    tick: Duration,
) -> Option<Command> {
    loop {
        let now = Instant::now();
        if now >= *next_tick {
            *next_tick = now + tick;
            return Some(Command::Dispatch(Msg::Tick {
                now_ms: Utc::now().timestamp_millis(),
            }));
        }
        match rx.recv_timeout(*next_tick - now) {
            Ok(command) => return Some(command),
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => return None,
        }
    }
}

fn open_store(config: &DeskConfig, ephemeral: bool) -> Box<dyn CacheStore> {
    if ephemeral {
        desk_info!("Solution cache kept in memory only");
        return Box::new(MemoryCacheStore::new());
    }
    if let Err(err) = ensure_state_dir(&config.state_dir) {
        desk_warn!("Solution cache will not persist: {}", err);
    }
    Box::new(FileCacheStore::new(&config.state_dir))
}

struct EventLoop {
    state: AppState,
    screen: Screen,
    turn: u64,
}

impl EventLoop {
    fn dispatch(&mut self, msg: Msg, runner: &EffectRunner) {
        self.turn += 1;
        set_loop_turn(self.turn);
        if !matches!(msg, Msg::Tick { .. }) {
            desk_debug!("Dispatching {:?}", msg);
        }

        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        let dirty = state.consume_dirty();
        self.state = state;
        runner.run(effects);

        if dirty {
            if let Some(frame) = self.screen.frame(&self.state.view()) {
                print_flush(&frame);
            }
        }
    }

    fn show(&self, section: Section) {
        let view = self.state.view();
        let text = match section {
            Section::Tickets => render_tickets(&view),
            Section::Logs => render_logs(&view),
        };
        print_flush(&text);
    }
}

fn print_flush(text: &str) {
    let mut stdout = io::stdout().lock();
    let _ = stdout.write_all(text.as_bytes());
    let _ = stdout.write_all(b"> ");
    let _ = stdout.flush();
}

/// Reads operator commands until stdin closes, then asks the loop to quit.
fn spawn_stdin_reader(tx: mpsc::Sender<Command>) {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            match commands::parse(&line) {
                Ok(Some(command)) => {
                    if tx.send(command).is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    println!("{err}\n{}", commands::HELP);
                }
            }
        }
        let _ = tx.send(Command::Quit);
    });
}
