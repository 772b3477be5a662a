use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Request rejected or answered with a non-success status.
    Network,
    /// Local precondition not met; never reaches the network.
    Validation,
    /// Response arrived after the selection it belonged to changed.
    StaleState,
    /// Push-stream transport error.
    Stream,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Network, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Validation, message)
    }

    pub fn stream(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Stream, message)
    }

    /// Keeps the message but marks the failure as belonging to a selection
    /// that is no longer current.
    pub fn into_stale(self) -> Self {
        Self::new(FailureKind::StaleState, self.message)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Network => write!(f, "network failure"),
            FailureKind::Validation => write!(f, "validation failure"),
            FailureKind::StaleState => write!(f, "stale response"),
            FailureKind::Stream => write!(f, "stream failure"),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
