use std::collections::VecDeque;

/// Maximum number of retained log lines.
pub const LOG_CAPACITY: usize = 100;

pub const CONNECTED_MARKER: &str = "[log stream connected]";

/// Transport-level events from the server push stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogStreamEvent {
    Connected,
    Line(String),
    Disconnected {
        attempt: u32,
        retry_in_ms: u64,
        reason: String,
    },
}

/// Bounded, most-recent-first buffer of log lines.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogBuffer {
    lines: VecDeque<String>,
}

impl LogBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `line`, dropping the oldest entries beyond capacity.
    pub fn prepend(&mut self, line: impl Into<String>) {
        self.lines.push_front(line.into());
        self.lines.truncate(LOG_CAPACITY);
    }

    pub fn apply(&mut self, event: &LogStreamEvent) {
        match event {
            LogStreamEvent::Connected => self.prepend(CONNECTED_MARKER),
            LogStreamEvent::Line(line) => self.prepend(line.clone()),
            LogStreamEvent::Disconnected {
                attempt,
                retry_in_ms,
                reason,
            } => self.prepend(disconnected_marker(*attempt, *retry_in_ms, reason)),
        }
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Newest first.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

fn disconnected_marker(attempt: u32, retry_in_ms: u64, reason: &str) -> String {
    let secs = retry_in_ms as f64 / 1_000.0;
    if reason.is_empty() {
        format!("[log stream disconnected, retrying in {secs:.1}s (attempt {attempt})]")
    } else {
        format!("[log stream disconnected: {reason}; retrying in {secs:.1}s (attempt {attempt})]")
    }
}
