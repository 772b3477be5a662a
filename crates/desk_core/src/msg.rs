use crate::{
    Failure, IncompleteSnapshot, LogStreamEvent, NoticeId, RequestToken, Solution, Ticket,
    TicketKey, UploadKind,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// App finished starting; load the ticket lists once.
    Started,
    /// Scheduler tick with the current wall clock in epoch milliseconds.
    Tick { now_ms: i64 },
    /// Operator asked for an immediate refetch of both ticket lists.
    RefreshClicked,
    /// Operator picked a ticket for review, or cleared the selection.
    TicketSelected(Option<TicketKey>),
    /// Operator asked for fresh solutions for the selected ticket.
    RegenerateClicked,
    /// Operator opened a solution for review by its position in the list.
    SolutionChosen(usize),
    /// Operator replaced the text of the working copy.
    WorkingCopyEdited(String),
    /// Operator dropped the working copy without submitting.
    ReviewDiscarded,
    /// Operator submitted the working copy to the issue tracker.
    SubmitClicked,
    /// Operator asked to upload a file; `None` when no file was chosen.
    UploadRequested {
        kind: UploadKind,
        path: Option<String>,
    },
    /// Operator dismissed a notice.
    NoticeDismissed(NoticeId),
    /// Resolvable ticket queue fetch finished.
    CompleteTicketsLoaded(Result<Vec<Ticket>, Failure>),
    /// Incomplete ticket history fetch finished.
    IncompleteTicketsLoaded(Result<IncompleteSnapshot, Failure>),
    /// Generate request finished.
    SolutionsGenerated {
        token: RequestToken,
        ticket_key: TicketKey,
        result: Result<Vec<Solution>, Failure>,
    },
    /// Submit request finished.
    SolutionSubmitted {
        token: RequestToken,
        ticket_key: TicketKey,
        result: Result<(), Failure>,
    },
    /// Upload request finished with the server's message.
    UploadFinished {
        kind: UploadKind,
        result: Result<String, Failure>,
    },
    /// Push stream connection state or a new line.
    LogStream(LogStreamEvent),
    /// Fallback for placeholder wiring.
    NoOp,
}
