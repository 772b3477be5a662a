use serde::{Deserialize, Serialize};

/// Unique identifier of a ticket in the external tracker (e.g. `ERP-42`).
pub type TicketKey = String;

/// A validated ticket waiting in the resolution queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    #[serde(rename = "ticket_key", alias = "key")]
    pub key: TicketKey,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub validated_at: Option<String>,
}

/// A ticket that failed validation; shown read-only in the history view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncompleteTicket {
    #[serde(rename = "ticket_key", alias = "key")]
    pub key: TicketKey,
    #[serde(default)]
    pub module: String,
    #[serde(default)]
    pub missing_fields: Vec<String>,
    #[serde(default)]
    pub validated_at: Option<String>,
    #[serde(rename = "llm_provider_model", alias = "model", default)]
    pub model: String,
}

/// A citation attached to a generated solution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceRef {
    Ticket { key: String },
    Raw(String),
}

impl SourceRef {
    pub fn label(&self) -> &str {
        match self {
            SourceRef::Ticket { key } => key,
            SourceRef::Raw(raw) => raw,
        }
    }
}

/// A generated candidate resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// Markdown body.
    #[serde(rename = "solution_text", alias = "text")]
    pub text: String,
    #[serde(default)]
    pub confidence: f64,
    #[serde(rename = "llm_provider_model", alias = "model", default)]
    pub model: String,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
}

/// Result of one incomplete-ticket fetch, including the server's next poll eta.
#[derive(Debug, Clone, PartialEq)]
pub struct IncompleteSnapshot {
    pub tickets: Vec<IncompleteTicket>,
    /// Epoch milliseconds of the next server-side poll.
    pub next_poll_eta: Option<i64>,
}

/// Clamp a confidence score into `[0, 1]` for display.
pub fn display_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}
