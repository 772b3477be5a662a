#![deny(missing_docs)]
//! Logging for the resolution desk workspace.
//!
//! The `desk_*` macros forward to `log` and prefix every line written on the
//! event-loop thread with `[turn N]`, so a late network response can be traced
//! back to the message that issued it. Threads that never ran a loop turn
//! (the engine runtime, the stdin reader) log without a prefix.

use std::cell::Cell;

thread_local! {
    static LOOP_TURN: Cell<u64> = const { Cell::new(0) };
}

/// Records the turn being dispatched on this thread.
pub fn set_loop_turn(turn: u64) {
    LOOP_TURN.with(|v| v.set(turn));
}

/// Turn being dispatched on this thread, 0 outside the event loop.
pub fn loop_turn() -> u64 {
    LOOP_TURN.with(|v| v.get())
}

#[doc(hidden)]
#[macro_export]
macro_rules! __desk_log {
    ($level:expr, $($arg:tt)*) => {{
        match $crate::loop_turn() {
            0 => log::log!($level, $($arg)*),
            turn => log::log!($level, "[turn {}] {}", turn, format_args!($($arg)*)),
        }
    }};
}

/// Trace-level line, e.g. every raw log stream message.
#[macro_export]
macro_rules! desk_trace {
    ($($arg:tt)*) => {
        $crate::__desk_log!(log::Level::Trace, $($arg)*)
    };
}

/// Debug-level line.
#[macro_export]
macro_rules! desk_debug {
    ($($arg:tt)*) => {
        $crate::__desk_log!(log::Level::Debug, $($arg)*)
    };
}

/// Info-level line.
#[macro_export]
macro_rules! desk_info {
    ($($arg:tt)*) => {
        $crate::__desk_log!(log::Level::Info, $($arg)*)
    };
}

/// Warn-level line.
#[macro_export]
macro_rules! desk_warn {
    ($($arg:tt)*) => {
        $crate::__desk_log!(log::Level::Warn, $($arg)*)
    };
}

/// Error-level line.
#[macro_export]
macro_rules! desk_error {
    ($($arg:tt)*) => {
        $crate::__desk_log!(log::Level::Error, $($arg)*)
    };
}

/// Terminal logger for test binaries; a second call is a no-op.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    // Another test may already own the global logger.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}
