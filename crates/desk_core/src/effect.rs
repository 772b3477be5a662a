use crate::{RequestToken, TicketKey, UploadKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    FetchCompleteTickets,
    FetchIncompleteTickets,
    GenerateSolutions {
        token: RequestToken,
        ticket_key: TicketKey,
    },
    SubmitSolution {
        token: RequestToken,
        ticket_key: TicketKey,
        solution_text: String,
        model: String,
    },
    UploadFile {
        kind: UploadKind,
        path: String,
    },
    /// Write the whole solution cache blob to durable storage.
    PersistSolutionCache { blob: String },
}
