use std::fmt::Write;

use desk_core::{AppViewModel, NoticeLevel, ReviewPhase};

/// Log lines shown in the main frame; `logs` prints the whole buffer.
const FRAME_LOG_LINES: usize = 5;

/// Unchanged frames between two bare status lines.
const STATUS_EVERY: u32 = 10;

/// Remembers the last frame so countdown-only changes are not redrawn.
#[derive(Debug, Default)]
pub struct Screen {
    last_body: Option<String>,
    quiet_frames: u32,
}

impl Screen {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the frame to print. When only the countdown moved this is
    /// `None`, except for a status line every [`STATUS_EVERY`] frames.
    pub fn frame(&mut self, view: &AppViewModel) -> Option<String> {
        let body = render_body(view);
        if self.last_body.as_deref() == Some(body.as_str()) {
            self.quiet_frames += 1;
            if self.quiet_frames < STATUS_EVERY {
                return None;
            }
            self.quiet_frames = 0;
            return Some(format!("{}\n", render_status(view)));
        }
        self.quiet_frames = 0;
        self.last_body = Some(body.clone());
        Some(format!("{}\n{}", render_status(view), body))
    }
}

pub fn render_status(view: &AppViewModel) -> String {
    let stream = match (&view.stream_error, view.stream_connected) {
        (_, true) => "live".to_string(),
        (Some(error), false) => format!("offline ({error})"),
        (None, false) => "offline".to_string(),
    };
    let refreshing = if view.refreshing { " (refreshing)" } else { "" };
    format!(
        "== desk | next poll {}{} | log stream {} | {} cached ==",
        view.countdown, refreshing, stream, view.cached_tickets
    )
}

fn render_body(view: &AppViewModel) -> String {
    let mut out = String::new();

    for notice in &view.notices {
        let tag = match notice.level {
            NoticeLevel::Success => "ok",
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = writeln!(out, "[{}] {}: {}", notice.id, tag, notice.text);
    }
    if let Some(error) = &view.inline_error {
        let _ = writeln!(out, "! {error}");
    }

    let _ = writeln!(
        out,
        "queue: {} ticket(s), history: {} incomplete",
        view.queue.len(),
        view.history.len()
    );

    match &view.selected {
        None => {
            let _ = writeln!(out, "no ticket selected");
        }
        Some(key) => {
            let _ = writeln!(out, "ticket {key}: {}", phase_label(view.phase));
            for solution in &view.solutions {
                let _ = writeln!(
                    out,
                    "  #{} [{:.0}% {}] {}",
                    solution.index + 1,
                    solution.confidence * 100.0,
                    solution.model,
                    first_line(&solution.text)
                );
                if !solution.sources.is_empty() {
                    let _ = writeln!(out, "     sources: {}", solution.sources.join(", "));
                }
            }
            if let Some(copy) = &view.working_copy {
                let edited = if copy.edited { ", edited" } else { "" };
                let _ = writeln!(out, "working copy of #{}{}:", copy.source_index + 1, edited);
                for line in copy.text.lines() {
                    let _ = writeln!(out, "  | {line}");
                }
            }
        }
    }

    for upload in &view.uploads {
        if upload.busy {
            let _ = writeln!(out, "uploading {}...", upload.kind.label());
        } else if let Some(message) = &upload.last_message {
            let _ = writeln!(out, "{} upload: {}", upload.kind.label(), message);
        }
    }

    for line in view.logs.iter().take(FRAME_LOG_LINES) {
        let _ = writeln!(out, "  log: {line}");
    }
    out
}

pub fn render_tickets(view: &AppViewModel) -> String {
    let mut out = String::from("queue:\n");
    if view.queue.is_empty() {
        out.push_str("  (empty)\n");
    }
    for row in &view.queue {
        let marker = if row.selected { '>' } else { ' ' };
        let cached = if row.cached { " *" } else { "" };
        let _ = writeln!(
            out,
            "{marker} {:<12} {:<20} {:>4.0}%  {}{}",
            row.key,
            row.module,
            row.confidence * 100.0,
            row.validated_at.as_deref().unwrap_or("-"),
            cached
        );
    }
    out.push_str("history:\n");
    if view.history.is_empty() {
        out.push_str("  (empty)\n");
    }
    for row in &view.history {
        let _ = writeln!(
            out,
            "  {:<12} {:<20} missing: {}  ({})",
            row.key,
            row.module,
            row.missing_fields.join(", "),
            row.model
        );
    }
    out
}

pub fn render_logs(view: &AppViewModel) -> String {
    if view.logs.is_empty() {
        return "(no log lines yet)\n".to_string();
    }
    let mut out = String::new();
    for line in &view.logs {
        let _ = writeln!(out, "{line}");
    }
    out
}

fn phase_label(phase: ReviewPhase) -> &'static str {
    match phase {
        ReviewPhase::Idle => "idle",
        ReviewPhase::Selected => "selected",
        ReviewPhase::GeneratingSolutions => "generating solutions...",
        ReviewPhase::SolutionsReady => "solutions ready",
        ReviewPhase::ReviewingSolution => "reviewing",
        ReviewPhase::Submitting => "submitting...",
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use desk_core::{AppViewModel, TicketRowView};

    use super::{render_status, render_tickets, Screen, STATUS_EVERY};

    fn view(countdown: &str) -> AppViewModel {
        AppViewModel {
            countdown: countdown.to_string(),
            queue: vec![TicketRowView {
                key: "ERP-42".to_string(),
                module: "AP.Invoice".to_string(),
                confidence: 0.82,
                validated_at: None,
                cached: true,
                selected: true,
            }],
            ..AppViewModel::default()
        }
    }

    #[test]
    fn countdown_only_change_is_not_redrawn() {
        let mut screen = Screen::new();
        assert!(screen.frame(&view("01:05")).is_some());
        assert!(screen.frame(&view("01:04")).is_none());

        let mut changed = view("01:03");
        changed.inline_error = Some("no solution is under review".to_string());
        let frame = screen.frame(&changed).unwrap();
        assert!(frame.contains("next poll 01:03"));
        assert!(frame.contains("! no solution is under review"));
    }

    #[test]
    fn quiet_countdown_still_prints_status_line() {
        let mut screen = Screen::new();
        assert!(screen.frame(&view("05:00")).is_some());

        let mut printed = Vec::new();
        for second in 1..=(2 * STATUS_EVERY) {
            let countdown = format!("04:{:02}", 60 - second);
            if let Some(frame) = screen.frame(&view(&countdown)) {
                printed.push((second, frame));
            }
        }

        assert_eq!(printed.len(), 2);
        assert_eq!(printed[0].0, STATUS_EVERY);
        assert_eq!(printed[0].1, "== desk | next poll 04:50 | log stream offline | 0 cached ==\n");
        assert_eq!(printed[1].0, 2 * STATUS_EVERY);
        assert!(!printed[1].1.contains("ERP-42"));
    }

    #[test]
    fn offline_status_names_stream_failure() {
        let mut offline = view("00:30");
        offline.stream_error = Some("stream failure: connection reset".to_string());
        assert!(render_status(&offline)
            .contains("log stream offline (stream failure: connection reset)"));

        offline.stream_connected = true;
        assert!(render_status(&offline).contains("log stream live |"));
    }

    #[test]
    fn ticket_list_marks_selection_and_cache() {
        let out = render_tickets(&view("--:--"));
        assert!(out.starts_with("queue:\n> ERP-42"));
        assert!(out.contains("82%"));
        assert!(out.trim_end().ends_with("(empty)"));
    }
}
