//! In-process event dispatch with at-least-once handler invocation.
//!
//! Handlers are registered against event names. Dispatching enqueues the
//! event; a worker loop picks it up and runs the handler, re-invoking it
//! from the start on retryable failure until the attempt budget is spent.
//! Every resolution is recorded to the event_runs table.

use crate::directory_store::{DirectoryStore, EventRunStatus};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum HandlerError {
    /// Invalid input; re-running the handler cannot succeed.
    #[error("terminal: {0}")]
    Terminal(String),
    /// Transient failure; the dispatcher re-invokes the whole handler.
    #[error(transparent)]
    Retryable(#[from] anyhow::Error),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Event name this handler is registered under.
    fn event(&self) -> &'static str;

    async fn handle(&self, payload: Value) -> Result<Value, HandlerError>;
}

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Handler invocations per event before giving up.
    pub max_attempts: usize,
    /// Pause between invocations.
    pub retry_delay: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

struct DispatchRequest {
    event: String,
    payload: Value,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("no handler registered for event '{0}'")]
    UnknownEvent(String),
    #[error("dispatcher is shut down")]
    Closed,
}

/// Cheap cloneable handle for enqueueing events.
#[derive(Clone)]
pub struct DispatcherHandle {
    sender: mpsc::Sender<DispatchRequest>,
    registered: Arc<Vec<&'static str>>,
}

impl DispatcherHandle {
    pub fn dispatch(&self, event: &str, payload: Value) -> Result<(), DispatchError> {
        if !self.registered.iter().any(|e| *e == event) {
            return Err(DispatchError::UnknownEvent(event.to_string()));
        }
        self.sender
            .try_send(DispatchRequest {
                event: event.to_string(),
                payload,
            })
            .map_err(|_| DispatchError::Closed)
    }
}

/// Owns the handler registry and the worker loop.
pub struct EventDispatcher {
    config: DispatcherConfig,
    handlers: HashMap<&'static str, Arc<dyn EventHandler>>,
    store: Arc<dyn DirectoryStore>,
    receiver: mpsc::Receiver<DispatchRequest>,
    shutdown: CancellationToken,
}

impl EventDispatcher {
    pub fn new(
        config: DispatcherConfig,
        store: Arc<dyn DirectoryStore>,
        handlers: Vec<Arc<dyn EventHandler>>,
        shutdown: CancellationToken,
    ) -> (Self, DispatcherHandle) {
        let (sender, receiver) = mpsc::channel(256);
        let registered: Vec<&'static str> = handlers.iter().map(|h| h.event()).collect();
        let handlers = handlers.into_iter().map(|h| (h.event(), h)).collect();

        let dispatcher = Self {
            config,
            handlers,
            store,
            receiver,
            shutdown,
        };
        let handle = DispatcherHandle {
            sender,
            registered: Arc::new(registered),
        };
        (dispatcher, handle)
    }

    /// Worker loop; runs until shutdown. Events are processed one at a time
    /// in arrival order - enrichment is not latency sensitive and serial
    /// execution keeps SQLite contention trivial.
    pub async fn run(mut self) {
        info!(
            "Event dispatcher started with {} handler(s)",
            self.handlers.len()
        );
        loop {
            tokio::select! {
                request = self.receiver.recv() => {
                    match request {
                        Some(request) => self.process(request).await,
                        None => break,
                    }
                }
                _ = self.shutdown.cancelled() => {
                    info!("Event dispatcher received shutdown signal");
                    break;
                }
            }
        }
        info!("Event dispatcher stopped");
    }

    async fn process(&self, request: DispatchRequest) {
        let Some(handler) = self.handlers.get(request.event.as_str()) else {
            // dispatch() filters unknown events; this only fires if the
            // registry and the handle disagree.
            error!("No handler for event '{}'", request.event);
            return;
        };

        let run_id = match self.store.record_event_start(&request.event) {
            Ok(id) => id,
            Err(e) => {
                error!("Failed to record event start for '{}': {}", request.event, e);
                return;
            }
        };

        let mut attempts = 0usize;
        let outcome = loop {
            attempts += 1;
            match handler.handle(request.payload.clone()).await {
                Ok(_) => break (EventRunStatus::Completed, None),
                Err(HandlerError::Terminal(message)) => {
                    warn!(
                        event = %request.event,
                        attempts,
                        "Handler failed terminally: {}",
                        message
                    );
                    break (EventRunStatus::Failed, Some(message));
                }
                Err(HandlerError::Retryable(e)) if attempts < self.config.max_attempts => {
                    warn!(
                        event = %request.event,
                        attempts,
                        "Handler failed, re-invoking: {:#}",
                        e
                    );
                    tokio::select! {
                        _ = tokio::time::sleep(self.config.retry_delay) => {}
                        _ = self.shutdown.cancelled() => {
                            break (EventRunStatus::Failed, Some("shutdown during retry".to_string()));
                        }
                    }
                }
                Err(HandlerError::Retryable(e)) => {
                    error!(
                        event = %request.event,
                        attempts,
                        "Handler failed after final attempt: {:#}",
                        e
                    );
                    break (EventRunStatus::Failed, Some(format!("{:#}", e)));
                }
            }
        };

        let (status, error_message) = outcome;
        if let Err(e) =
            self.store
                .record_event_finish(run_id, status, attempts as i64, error_message)
        {
            error!("Failed to record event finish for '{}': {}", request.event, e);
        }
    }
}
