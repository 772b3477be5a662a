use desk_core::{
    Failure, IncompleteSnapshot, LogStreamEvent, RequestToken, Solution, Ticket, TicketKey,
    UploadKind,
};
use thiserror::Error;

/// Events the engine reports back to the event loop.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    CompleteTickets(Result<Vec<Ticket>, GatewayError>),
    IncompleteTickets(Result<IncompleteSnapshot, GatewayError>),
    SolutionsGenerated {
        token: RequestToken,
        ticket_key: TicketKey,
        result: Result<Vec<Solution>, GatewayError>,
    },
    SolutionPosted {
        token: RequestToken,
        ticket_key: TicketKey,
        result: Result<(), GatewayError>,
    },
    UploadFinished {
        kind: UploadKind,
        result: Result<String, GatewayError>,
    },
    LogStream(LogStreamEvent),
}

/// Receives engine events; implementations must not block.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: EngineEvent);
}

pub struct ChannelEventSink {
    tx: std::sync::mpsc::Sender<EngineEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: std::sync::mpsc::Sender<EngineEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: EngineEvent) {
        let _ = self.tx.send(event);
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("invalid api base url: {0}")]
    InvalidBaseUrl(String),
    #[error("timeout: {0}")]
    Timeout(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("http status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("invalid response body: {0}")]
    Decode(String),
    #[error("cannot read {path}: {message}")]
    File { path: String, message: String },
}

impl From<GatewayError> for Failure {
    fn from(err: GatewayError) -> Self {
        let message = err.to_string();
        match err {
            GatewayError::File { .. } => Failure::validation(message),
            _ => Failure::network(message),
        }
    }
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start engine runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("failed to build http client: {0}")]
    Client(#[from] GatewayError),
}

#[cfg(test)]
mod tests {
    use desk_core::{Failure, FailureKind};

    use super::GatewayError;

    #[test]
    fn unreadable_upload_file_maps_to_validation_failure() {
        let failure: Failure = GatewayError::File {
            path: "missing.csv".to_string(),
            message: "No such file or directory".to_string(),
        }
        .into();
        assert_eq!(failure.kind, FailureKind::Validation);
        assert!(failure.message.contains("missing.csv"));
    }

    #[test]
    fn status_maps_to_network_failure() {
        let failure: Failure = GatewayError::Status {
            status: 502,
            body: "bad gateway".to_string(),
        }
        .into();
        assert_eq!(failure.kind, FailureKind::Network);
        assert_eq!(failure.message, "http status 502: bad gateway");
    }
}
