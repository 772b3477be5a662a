use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use desk_core::{RequestToken, TicketKey, UploadKind};
use desk_logging::{desk_debug, desk_info, desk_warn};
use tokio_util::sync::CancellationToken;

use crate::gateway::{Gateway, GatewaySettings, ReqwestGateway};
use crate::log_stream::{BackoffPolicy, LogStreamTarget};
use crate::{EngineError, EngineEvent, EventSink};

#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub gateway: GatewaySettings,
    pub backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
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
    Upload {
        kind: UploadKind,
        path: PathBuf,
    },
}

enum Job {
    Request(EngineCommand),
    StartLogStream,
}

/// Owns the background thread that hosts the async runtime.
pub struct EngineHandle {
    cmd_tx: Option<mpsc::Sender<Job>>,
    worker: Option<thread::JoinHandle<()>>,
    cancel: CancellationToken,
    stream_started: AtomicBool,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings, sink: Arc<dyn EventSink>) -> Result<Self, EngineError> {
        let gateway = ReqwestGateway::new(&settings.gateway)?;
        desk_info!("Engine gateway at {}", gateway.base_url());
        let gateway = Arc::new(gateway);
        let stream = LogStreamTarget::new(&settings.gateway, settings.backoff)?;
        Self::spawn(gateway, Some(stream), sink)
    }

    /// Runs commands against `gateway`; without a stream target the log
    /// stream is never started.
    pub fn with_gateway(
        gateway: Arc<dyn Gateway>,
        stream: Option<LogStreamTarget>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        Self::spawn(gateway, stream, sink)
    }

    fn spawn(
        gateway: Arc<dyn Gateway>,
        stream: Option<LogStreamTarget>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("desk-engine")
            .enable_all()
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<Job>();
        let cancel = CancellationToken::new();
        let stream_cancel = cancel.clone();

        let worker = thread::Builder::new()
            .name("desk-engine".to_string())
            .spawn(move || {
                let mut stream = stream;
                while let Ok(job) = cmd_rx.recv() {
                    match job {
                        Job::Request(command) => {
                            let gateway = gateway.clone();
                            let sink = sink.clone();
                            runtime.spawn(async move {
                                let event = handle_command(gateway.as_ref(), command).await;
                                sink.emit(event);
                            });
                        }
                        Job::StartLogStream => match stream.take() {
                            Some(target) => {
                                desk_info!("Starting log stream from {}", target.url());
                                runtime.spawn(target.run(sink.clone(), stream_cancel.clone()));
                            }
                            None => desk_warn!("No log stream configured"),
                        },
                    }
                }
                desk_debug!("Engine command channel closed");
                runtime.shutdown_timeout(Duration::from_secs(1));
            })?;

        Ok(Self {
            cmd_tx: Some(cmd_tx),
            worker: Some(worker),
            cancel,
            stream_started: AtomicBool::new(false),
        })
    }

    pub fn send(&self, command: EngineCommand) {
        self.submit(Job::Request(command));
    }

    /// Starts the supervised log stream; later calls do nothing.
    pub fn start_log_stream(&self) {
        if !self.stream_started.swap(true, Ordering::SeqCst) {
            self.submit(Job::StartLogStream);
        }
    }

    /// Cancels the log stream and waits for the worker thread. Requests still
    /// in flight get a short grace period.
    pub fn shutdown(&mut self) {
        self.cancel.cancel();
        self.cmd_tx.take();
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                desk_warn!("Engine worker panicked during shutdown");
            }
        }
    }

    fn submit(&self, job: Job) {
        let Some(tx) = &self.cmd_tx else {
            desk_warn!("Engine command dropped after shutdown");
            return;
        };
        if tx.send(job).is_err() {
            desk_warn!("Engine worker is gone; command dropped");
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn handle_command(gateway: &dyn Gateway, command: EngineCommand) -> EngineEvent {
    match command {
        EngineCommand::FetchCompleteTickets => {
            EngineEvent::CompleteTickets(gateway.complete_tickets().await)
        }
        EngineCommand::FetchIncompleteTickets => {
            EngineEvent::IncompleteTickets(gateway.incomplete_tickets().await)
        }
        EngineCommand::GenerateSolutions { token, ticket_key } => {
            let result = gateway.generate_solutions(&ticket_key).await;
            EngineEvent::SolutionsGenerated {
                token,
                ticket_key,
                result,
            }
        }
        EngineCommand::SubmitSolution {
            token,
            ticket_key,
            solution_text,
            model,
        } => {
            let result = gateway
                .post_solution(&ticket_key, &solution_text, &model)
                .await;
            EngineEvent::SolutionPosted {
                token,
                ticket_key,
                result,
            }
        }
        EngineCommand::Upload { kind, path } => EngineEvent::UploadFinished {
            kind,
            result: gateway.upload(kind, &path).await,
        },
    }
}
