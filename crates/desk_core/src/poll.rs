//! Countdown to the next server-side poll.
//!
//! The scheduler never invents an eta. It formats the last value the server
//! declared and raises a single refresh signal once that value is reached.

/// Interval of the scheduler tick in milliseconds.
pub const POLL_TICK_MS: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickOutcome {
    /// The rendered countdown differs from the previous tick.
    pub countdown_changed: bool,
    /// The eta boundary was crossed and a refetch should start.
    pub refresh_due: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PollScheduler {
    eta_ms: Option<i64>,
    armed: bool,
    remaining_secs: Option<u64>,
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eta_ms(&self) -> Option<i64> {
        self.eta_ms
    }

    /// Records an eta from a successful incomplete-ticket fetch.
    ///
    /// Only a value that differs from the current one re-arms the refresh
    /// trigger. Returns whether the eta changed.
    pub fn on_eta(&mut self, eta_ms: i64) -> bool {
        if self.eta_ms == Some(eta_ms) {
            return false;
        }
        self.eta_ms = Some(eta_ms);
        self.armed = true;
        true
    }

    pub fn tick(&mut self, now_ms: i64) -> TickOutcome {
        let Some(eta_ms) = self.eta_ms else {
            return TickOutcome::default();
        };

        let delta = eta_ms.saturating_sub(now_ms);
        let remaining = remaining_secs(delta);
        let countdown_changed = self.remaining_secs != Some(remaining);
        self.remaining_secs = Some(remaining);

        let refresh_due = delta <= 0 && self.armed;
        if refresh_due {
            self.armed = false;
        }

        TickOutcome {
            countdown_changed,
            refresh_due,
        }
    }

    /// `mm:ss` until the next poll, or `--:--` before any eta is known.
    pub fn countdown_label(&self) -> String {
        match self.remaining_secs {
            Some(secs) => format_countdown(secs),
            None => "--:--".to_string(),
        }
    }
}

/// Whole seconds left, rounding partial seconds up and flooring at zero.
fn remaining_secs(delta_ms: i64) -> u64 {
    if delta_ms <= 0 {
        return 0;
    }
    (delta_ms as u64).div_ceil(1_000)
}

pub fn format_countdown(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::{format_countdown, remaining_secs};

    #[test]
    fn partial_seconds_round_up() {
        assert_eq!(remaining_secs(1), 1);
        assert_eq!(remaining_secs(1_000), 1);
        assert_eq!(remaining_secs(1_001), 2);
        assert_eq!(remaining_secs(0), 0);
        assert_eq!(remaining_secs(-5_000), 0);
    }

    #[test]
    fn minutes_do_not_wrap() {
        assert_eq!(format_countdown(65), "01:05");
        assert_eq!(format_countdown(3_900), "65:00");
        assert_eq!(format_countdown(0), "00:00");
    }
}
