use std::path::Path;
use std::time::Duration;

use desk_core::{IncompleteSnapshot, IncompleteTicket, Solution, Ticket, UploadKind};
use desk_logging::{desk_debug, desk_warn};
use reqwest::multipart::{Form, Part};
use reqwest::{Response, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Longest error body carried into a failure message.
const MAX_ERROR_BODY: usize = 200;

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// The API gateway the dashboard talks to.
#[async_trait::async_trait]
pub trait Gateway: Send + Sync {
    async fn complete_tickets(&self) -> Result<Vec<Ticket>, GatewayError>;

    /// Incomplete tickets plus the server's next poll eta.
    async fn incomplete_tickets(&self) -> Result<IncompleteSnapshot, GatewayError>;

    async fn next_poll_eta(&self) -> Result<i64, GatewayError>;

    async fn generate_solutions(&self, ticket_key: &str) -> Result<Vec<Solution>, GatewayError>;

    async fn post_solution(
        &self,
        ticket_key: &str,
        solution_text: &str,
        model: &str,
    ) -> Result<(), GatewayError>;

    /// Uploads `path` and returns the server's message.
    async fn upload(&self, kind: UploadKind, path: &Path) -> Result<String, GatewayError>;
}

#[derive(Deserialize)]
struct TicketsResponse<T> {
    #[serde(default = "Vec::new")]
    tickets: Vec<T>,
}

#[derive(Deserialize)]
struct IncompleteResponse {
    #[serde(default)]
    tickets: Vec<IncompleteTicket>,
    next_poll_time: Option<f64>,
}

#[derive(Deserialize)]
struct EtaResponse {
    next_poll_eta: f64,
}

#[derive(Deserialize)]
struct SolutionsResponse {
    #[serde(default)]
    solutions: Vec<Solution>,
}

#[derive(Serialize)]
struct PostSolutionBody<'a> {
    solution_text: &'a str,
    llm_provider_model: &'a str,
}

#[derive(Deserialize)]
struct UploadResponse {
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ReqwestGateway {
    client: reqwest::Client,
    base_url: Url,
}

impl ReqwestGateway {
    pub fn new(settings: &GatewaySettings) -> Result<Self, GatewayError> {
        let base_url = parse_base_url(&settings.base_url)?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base}/seg/seg/...`, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, GatewayError> {
        endpoint(&self.base_url, segments)
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, GatewayError> {
        let url = self.endpoint(segments)?;
        desk_debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        read_json(response).await
    }
}

#[async_trait::async_trait]
impl Gateway for ReqwestGateway {
    async fn complete_tickets(&self) -> Result<Vec<Ticket>, GatewayError> {
        let body: TicketsResponse<Ticket> = self.get_json(&["api", "complete-tickets"]).await?;
        Ok(body.tickets)
    }

    async fn incomplete_tickets(&self) -> Result<IncompleteSnapshot, GatewayError> {
        let body: IncompleteResponse = self.get_json(&["api", "incomplete-tickets"]).await?;
        let next_poll_eta = match body.next_poll_time {
            Some(eta) => Some(eta as i64),
            None => match self.next_poll_eta().await {
                Ok(eta) => Some(eta),
                Err(err) => {
                    desk_warn!("Incomplete tickets arrived without an eta: {}", err);
                    None
                }
            },
        };
        Ok(IncompleteSnapshot {
            tickets: body.tickets,
            next_poll_eta,
        })
    }

    async fn next_poll_eta(&self) -> Result<i64, GatewayError> {
        let body: EtaResponse = self.get_json(&["api", "next-poll-eta"]).await?;
        Ok(body.next_poll_eta as i64)
    }

    async fn generate_solutions(&self, ticket_key: &str) -> Result<Vec<Solution>, GatewayError> {
        let url = self.endpoint(&["api", "generate-solutions", ticket_key])?;
        desk_debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: SolutionsResponse = read_json(response).await?;
        Ok(body.solutions)
    }

    async fn post_solution(
        &self,
        ticket_key: &str,
        solution_text: &str,
        model: &str,
    ) -> Result<(), GatewayError> {
        let url = self.endpoint(&["api", "post-solution", ticket_key])?;
        desk_debug!("POST {} ({} chars)", url, solution_text.len());
        let response = self
            .client
            .post(url)
            .json(&PostSolutionBody {
                solution_text,
                llm_provider_model: model,
            })
            .send()
            .await
            .map_err(map_reqwest_error)?;
        check_status(response).await.map(|_| ())
    }

    async fn upload(&self, kind: UploadKind, path: &Path) -> Result<String, GatewayError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|err| GatewayError::File {
                path: path.display().to_string(),
                message: err.to_string(),
            })?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let form = Form::new().part("file", Part::bytes(bytes).file_name(file_name));

        let url = self.endpoint(&["api", upload_segment(kind)])?;
        desk_debug!("POST {} (multipart)", url);
        let response = self
            .client
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let body: UploadResponse = read_json(response).await?;
        Ok(body
            .message
            .unwrap_or_else(|| "upload complete".to_string()))
    }
}

fn upload_segment(kind: UploadKind) -> &'static str {
    match kind {
        UploadKind::Knowledge => "upload-knowledge",
        UploadKind::SolvedTickets => "upload-solved-tickets",
    }
}

pub(crate) fn parse_base_url(raw: &str) -> Result<Url, GatewayError> {
    let url = Url::parse(raw.trim()).map_err(|err| GatewayError::InvalidBaseUrl(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(GatewayError::InvalidBaseUrl(raw.to_string()));
    }
    Ok(url)
}

pub(crate) fn endpoint(base: &Url, segments: &[&str]) -> Result<Url, GatewayError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| GatewayError::InvalidBaseUrl(base.to_string()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check_status(response: Response) -> Result<Response, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(GatewayError::Status {
        status: status.as_u16(),
        body: truncate_body(body.trim()),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, GatewayError> {
    let response = check_status(response).await?;
    let text = response.text().await.map_err(map_reqwest_error)?;
    serde_json::from_str(&text).map_err(|err| GatewayError::Decode(err.to_string()))
}

fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}

pub(crate) fn map_reqwest_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        return GatewayError::Timeout(err.to_string());
    }
    GatewayError::Network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::{endpoint, parse_base_url, truncate_body, MAX_ERROR_BODY};

    #[test]
    fn endpoint_encodes_ticket_key_segment() {
        let base = parse_base_url("http://localhost:8000").unwrap();
        let url = endpoint(&base, &["api", "generate-solutions", "ERP 42/a"]).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8000/api/generate-solutions/ERP%2042%2Fa"
        );
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let base = parse_base_url("https://desk.example.com/gateway/").unwrap();
        let url = endpoint(&base, &["api", "complete-tickets"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://desk.example.com/gateway/api/complete-tickets"
        );
    }

    #[test]
    fn base_url_must_be_hierarchical() {
        assert!(parse_base_url("mailto:ops@example.com").is_err());
        assert!(parse_base_url("not a url").is_err());
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(MAX_ERROR_BODY + 50);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), MAX_ERROR_BODY + 3);
        assert!(truncated.ends_with("..."));
    }
}
