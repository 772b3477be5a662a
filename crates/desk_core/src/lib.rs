//! Resolution desk core: pure state machine and view-model helpers.
mod cache;
mod effect;
mod failure;
mod lifecycle;
mod log_buffer;
mod model;
mod msg;
mod notice;
mod poll;
mod state;
mod update;
mod view_model;

pub use cache::{CacheStore, MemoryCacheStore, SolutionCache};
pub use effect::Effect;
pub use failure::{Failure, FailureKind};
pub use lifecycle::{
    GenerateOutcome, GenerateRequest, RequestToken, ReviewPhase, SubmitOutcome, SubmitRequest,
    TicketLifecycle, WorkingCopy,
};
pub use log_buffer::{LogBuffer, LogStreamEvent, CONNECTED_MARKER, LOG_CAPACITY};
pub use model::{
    display_confidence, IncompleteSnapshot, IncompleteTicket, Solution, SourceRef, Ticket,
    TicketKey,
};
pub use msg::Msg;
pub use notice::{Notice, NoticeId, NoticeLevel, MAX_NOTICES};
pub use poll::{format_countdown, PollScheduler, TickOutcome, POLL_TICK_MS};
pub use state::{AppState, UploadKind, UploadState};
pub use update::update;
pub use view_model::{
    AppViewModel, IncompleteRowView, SolutionView, TicketRowView, UploadView, WorkingCopyView,
};
