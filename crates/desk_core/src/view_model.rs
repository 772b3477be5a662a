use crate::{Notice, ReviewPhase, TicketKey, UploadKind};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppViewModel {
    pub phase: ReviewPhase,
    pub selected: Option<TicketKey>,
    /// A generate or submit request is in flight for the selection.
    pub busy: bool,
    pub queue: Vec<TicketRowView>,
    pub history: Vec<IncompleteRowView>,
    pub solutions: Vec<SolutionView>,
    pub working_copy: Option<WorkingCopyView>,
    pub countdown: String,
    pub refreshing: bool,
    /// Newest first.
    pub logs: Vec<String>,
    pub stream_connected: bool,
    /// Last stream failure while offline, e.g. "stream failure: http status 503".
    pub stream_error: Option<String>,
    pub notices: Vec<Notice>,
    pub inline_error: Option<String>,
    pub uploads: Vec<UploadView>,
    pub cached_tickets: usize,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TicketRowView {
    pub key: TicketKey,
    pub module: String,
    pub confidence: f64,
    pub validated_at: Option<String>,
    pub cached: bool,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncompleteRowView {
    pub key: TicketKey,
    pub module: String,
    pub missing_fields: Vec<String>,
    pub validated_at: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolutionView {
    pub index: usize,
    pub text: String,
    pub confidence: f64,
    pub model: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkingCopyView {
    pub source_index: usize,
    pub text: String,
    pub model: String,
    /// Text differs from the cached original.
    pub edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadView {
    pub kind: UploadKind,
    pub busy: bool,
    pub last_message: Option<String>,
}
