//! Desk engine: API gateway, log stream supervision and effect execution.
mod engine;
mod gateway;
mod log_stream;
mod persist;
mod sse;
mod types;

pub use engine::{EngineCommand, EngineHandle, EngineSettings};
pub use gateway::{Gateway, GatewaySettings, ReqwestGateway};
pub use log_stream::{BackoffPolicy, LogStreamTarget};
pub use persist::{ensure_state_dir, AtomicFileWriter, PersistError};
pub use sse::SseDecoder;
pub use types::{ChannelEventSink, EngineError, EngineEvent, EventSink, GatewayError};
