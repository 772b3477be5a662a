use desk_logging::desk_error;

use crate::notice::Notices;
use crate::view_model::{
    AppViewModel, IncompleteRowView, SolutionView, TicketRowView, UploadView, WorkingCopyView,
};
use crate::{
    display_confidence, Effect, Failure, IncompleteTicket, LogBuffer, NoticeId, NoticeLevel,
    PollScheduler, SolutionCache, Ticket, TicketLifecycle,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UploadKind {
    /// Module knowledge spreadsheet.
    Knowledge,
    /// Historical solved tickets export.
    SolvedTickets,
}

impl UploadKind {
    pub const ALL: [UploadKind; 2] = [UploadKind::Knowledge, UploadKind::SolvedTickets];

    pub fn label(self) -> &'static str {
        match self {
            UploadKind::Knowledge => "knowledge",
            UploadKind::SolvedTickets => "solved tickets",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadState {
    pub busy: bool,
    pub last_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct FetchFlags {
    complete: bool,
    incomplete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct StreamStatus {
    connected: bool,
    lost_since_connect: bool,
}

/// Process-wide store of the dashboard. Mutated only through [`crate::update`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    queue: Vec<Ticket>,
    history: Vec<IncompleteTicket>,
    cache: SolutionCache,
    lifecycle: TicketLifecycle,
    poll: PollScheduler,
    logs: LogBuffer,
    notices: Notices,
    knowledge_upload: UploadState,
    solved_upload: UploadState,
    inline_error: Option<Failure>,
    fetching: FetchFlags,
    stream: StreamStatus,
    stream_failure: Option<Failure>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from a cache restored from durable storage.
    pub fn with_cache(cache: SolutionCache) -> Self {
        Self {
            cache,
            ..Self::default()
        }
    }

    pub fn queue(&self) -> &[Ticket] {
        &self.queue
    }

    pub fn history(&self) -> &[IncompleteTicket] {
        &self.history
    }

    pub fn cache(&self) -> &SolutionCache {
        &self.cache
    }

    pub fn lifecycle(&self) -> &TicketLifecycle {
        &self.lifecycle
    }

    /// Why the log stream last dropped; cleared once it is back.
    pub fn stream_failure(&self) -> Option<&Failure> {
        self.stream_failure.as_ref()
    }

    pub fn poll(&self) -> &PollScheduler {
        &self.poll
    }

    pub fn logs(&self) -> &LogBuffer {
        &self.logs
    }

    pub fn inline_error(&self) -> Option<&Failure> {
        self.inline_error.as_ref()
    }

    pub fn upload(&self, kind: UploadKind) -> &UploadState {
        match kind {
            UploadKind::Knowledge => &self.knowledge_upload,
            UploadKind::SolvedTickets => &self.solved_upload,
        }
    }

    pub fn view(&self) -> AppViewModel {
        let selected = self.lifecycle.selected();
        let queue = self
            .queue
            .iter()
            .map(|ticket| TicketRowView {
                key: ticket.key.clone(),
                module: ticket.module.clone(),
                confidence: display_confidence(ticket.confidence),
                validated_at: ticket.validated_at.clone(),
                cached: self.cache.has(&ticket.key),
                selected: selected == Some(ticket.key.as_str()),
            })
            .collect();
        let history = self
            .history
            .iter()
            .map(|ticket| IncompleteRowView {
                key: ticket.key.clone(),
                module: ticket.module.clone(),
                missing_fields: ticket.missing_fields.clone(),
                validated_at: ticket.validated_at.clone(),
                model: ticket.model.clone(),
            })
            .collect();
        let solutions = self
            .lifecycle
            .solutions()
            .iter()
            .enumerate()
            .map(|(index, solution)| SolutionView {
                index,
                text: solution.text.clone(),
                confidence: display_confidence(solution.confidence),
                model: solution.model.clone(),
                sources: solution
                    .sources
                    .iter()
                    .map(|source| source.label().to_string())
                    .collect(),
            })
            .collect();
        let working_copy = self.lifecycle.working_copy().map(|copy| {
            let edited = self
                .lifecycle
                .solutions()
                .get(copy.source_index)
                .is_some_and(|original| original.text != copy.solution.text);
            WorkingCopyView {
                source_index: copy.source_index,
                text: copy.solution.text.clone(),
                model: copy.solution.model.clone(),
                edited,
            }
        });
        let uploads = UploadKind::ALL
            .iter()
            .map(|&kind| {
                let upload = self.upload(kind);
                UploadView {
                    kind,
                    busy: upload.busy,
                    last_message: upload.last_message.clone(),
                }
            })
            .collect();

        AppViewModel {
            phase: self.lifecycle.phase(),
            selected: selected.map(ToOwned::to_owned),
            busy: self.lifecycle.is_busy(),
            queue,
            history,
            solutions,
            working_copy,
            countdown: self.poll.countdown_label(),
            refreshing: self.fetching.complete || self.fetching.incomplete,
            logs: self.logs.iter().map(ToOwned::to_owned).collect(),
            stream_connected: self.stream.connected,
            stream_error: self.stream_failure.as_ref().map(ToString::to_string),
            notices: self.notices.to_vec(),
            inline_error: self.inline_error.as_ref().map(|f| f.message.clone()),
            uploads,
            cached_tickets: self.cache.len(),
            dirty: self.dirty,
        }
    }

    /// Returns whether the view changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn cache_mut(&mut self) -> &mut SolutionCache {
        &mut self.cache
    }

    pub(crate) fn poll_mut(&mut self) -> &mut PollScheduler {
        &mut self.poll
    }

    pub(crate) fn logs_mut(&mut self) -> &mut LogBuffer {
        &mut self.logs
    }

    pub(crate) fn upload_mut(&mut self, kind: UploadKind) -> &mut UploadState {
        match kind {
            UploadKind::Knowledge => &mut self.knowledge_upload,
            UploadKind::SolvedTickets => &mut self.solved_upload,
        }
    }

    /// Splits out the lifecycle and the cache it reads from.
    pub(crate) fn lifecycle_and_cache(&mut self) -> (&mut TicketLifecycle, &SolutionCache) {
        (&mut self.lifecycle, &self.cache)
    }

    pub(crate) fn lifecycle_mut(&mut self) -> &mut TicketLifecycle {
        &mut self.lifecycle
    }

    pub(crate) fn is_queued(&self, key: &str) -> bool {
        self.queue.iter().any(|ticket| ticket.key == key)
    }

    pub(crate) fn replace_queue(&mut self, tickets: Vec<Ticket>) {
        self.queue = tickets;
        self.fetching.complete = false;
        self.mark_dirty();
    }

    pub(crate) fn replace_history(&mut self, tickets: Vec<IncompleteTicket>) {
        self.history = tickets;
        self.fetching.incomplete = false;
        self.mark_dirty();
    }

    pub(crate) fn complete_fetch_failed(&mut self) {
        self.fetching.complete = false;
        self.mark_dirty();
    }

    pub(crate) fn incomplete_fetch_failed(&mut self) {
        self.fetching.incomplete = false;
        self.mark_dirty();
    }

    /// Issues list fetches that are not already in flight.
    pub(crate) fn begin_refresh(&mut self) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(2);
        if !self.fetching.incomplete {
            self.fetching.incomplete = true;
            effects.push(Effect::FetchIncompleteTickets);
        }
        if !self.fetching.complete {
            self.fetching.complete = true;
            effects.push(Effect::FetchCompleteTickets);
        }
        if !effects.is_empty() {
            self.mark_dirty();
        }
        effects
    }

    /// Removes `key` from the queue and evicts its cache entry together.
    /// Returns whether the cache changed.
    pub(crate) fn resolve_ticket(&mut self, key: &str) -> bool {
        self.queue = self
            .queue
            .iter()
            .filter(|ticket| ticket.key != key)
            .cloned()
            .collect();
        self.mark_dirty();
        self.cache.evict(key)
    }

    /// Encodes the cache for durable storage after a mutation.
    pub(crate) fn persist_cache(&self) -> Option<Effect> {
        match self.cache.to_blob() {
            Ok(blob) => Some(Effect::PersistSolutionCache { blob }),
            Err(err) => {
                desk_error!("Failed to encode solution cache: {}", err);
                None
            }
        }
    }

    pub(crate) fn notify(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notices.push(level, text);
        self.mark_dirty();
    }

    pub(crate) fn dismiss_notice(&mut self, id: NoticeId) {
        if self.notices.dismiss(id) {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_inline_error(&mut self, failure: Failure) {
        self.inline_error = Some(failure);
        self.mark_dirty();
    }

    pub(crate) fn clear_inline_error(&mut self) {
        if self.inline_error.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn stream_connected(&mut self) -> bool {
        let reconnected = self.stream.lost_since_connect;
        self.stream = StreamStatus {
            connected: true,
            lost_since_connect: false,
        };
        self.stream_failure = None;
        reconnected
    }

    pub(crate) fn stream_lost(&mut self, failure: Failure) {
        self.stream = StreamStatus {
            connected: false,
            lost_since_connect: true,
        };
        self.stream_failure = Some(failure);
    }
}
