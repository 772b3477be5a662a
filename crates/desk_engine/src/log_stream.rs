use std::sync::Arc;
use std::time::Duration;

use desk_core::LogStreamEvent;
use desk_logging::{desk_debug, desk_info, desk_trace, desk_warn};
use futures_util::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::Url;
use tokio_util::sync::CancellationToken;

use crate::gateway::{endpoint, map_reqwest_error, parse_base_url};
use crate::sse::SseDecoder;
use crate::{EngineEvent, EventSink, GatewayError, GatewaySettings};

/// Capped exponential reconnect delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(1),
            max: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Delay before reconnect `attempt`, counted from 1 since the last
    /// successful connect.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << shift)
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

/// Where and how the polling log stream is consumed.
#[derive(Debug, Clone)]
pub struct LogStreamTarget {
    client: reqwest::Client,
    url: Url,
    backoff: BackoffPolicy,
}

struct Disconnect {
    connected: bool,
    reason: String,
}

impl LogStreamTarget {
    /// The stream client has no overall request timeout; only connecting is bounded.
    pub fn new(settings: &GatewaySettings, backoff: BackoffPolicy) -> Result<Self, GatewayError> {
        let base = parse_base_url(&settings.base_url)?;
        let url = endpoint(&base, &["api", "polling-logs"])?;
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .build()
            .map_err(|err| GatewayError::Network(err.to_string()))?;
        Ok(Self {
            client,
            url,
            backoff,
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Keeps one connection alive until `cancel` fires.
    pub async fn run(self, sink: Arc<dyn EventSink>, cancel: CancellationToken) {
        let mut attempt: u32 = 0;
        loop {
            let disconnect = tokio::select! {
                _ = cancel.cancelled() => break,
                disconnect = self.stream_once(sink.as_ref()) => disconnect,
            };
            attempt = if disconnect.connected { 1 } else { attempt + 1 };
            let delay = self.backoff.delay(attempt);
            desk_warn!(
                "Log stream lost ({}); reconnect attempt {} in {:?}",
                disconnect.reason,
                attempt,
                delay
            );
            sink.emit(EngineEvent::LogStream(LogStreamEvent::Disconnected {
                attempt,
                retry_in_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                reason: disconnect.reason,
            }));
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }
        desk_info!("Log stream stopped");
    }

    async fn stream_once(&self, sink: &dyn EventSink) -> Disconnect {
        let response = match self
            .client
            .get(self.url.clone())
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return Disconnect {
                    connected: false,
                    reason: map_reqwest_error(err).to_string(),
                }
            }
        };
        if !response.status().is_success() {
            return Disconnect {
                connected: false,
                reason: format!("http status {}", response.status().as_u16()),
            };
        }

        desk_info!("Log stream connected to {}", self.url);
        sink.emit(EngineEvent::LogStream(LogStreamEvent::Connected));

        let mut decoder = SseDecoder::new();
        let mut body = response.bytes_stream();
        let reason = loop {
            match body.next().await {
                Some(Ok(chunk)) => {
                    for line in decoder.push(&chunk) {
                        desk_trace!("Log stream line: {}", line);
                        sink.emit(EngineEvent::LogStream(LogStreamEvent::Line(line)));
                    }
                }
                Some(Err(err)) => break map_reqwest_error(err).to_string(),
                None => break "stream closed by server".to_string(),
            }
        };
        for line in decoder.finish() {
            sink.emit(EngineEvent::LogStream(LogStreamEvent::Line(line)));
        }
        desk_debug!("Log stream ended: {}", reason);
        Disconnect {
            connected: true,
            reason,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::BackoffPolicy;

    #[test]
    fn backoff_doubles_then_caps() {
        let policy = BackoffPolicy::default();
        let delays: Vec<u64> = (1..=7).map(|n| policy.delay(n).as_secs()).collect();
        assert_eq!(delays, vec![1, 2, 4, 8, 16, 30, 30]);
    }

    #[test]
    fn huge_attempt_counts_stay_at_cap() {
        let policy = BackoffPolicy {
            initial: Duration::from_millis(250),
            max: Duration::from_secs(5),
        };
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(5));
        assert_eq!(policy.delay(0), Duration::from_millis(250));
    }
}
