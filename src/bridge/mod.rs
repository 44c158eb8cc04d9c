//! Request/response correlation over message-passing execution contexts.
//!
//! # Architecture
//!
//! ```text
//! send(worker, command) ──→ pending[id] ──→ RequestEnvelope ──→ context
//!        │                     │  │                                 │
//!        │                     │  └─ timer: Timeout after 30s       │
//!        ↓                     │                                    │
//!   PendingReply ←──oneshot────┴──── reader loop ←── ResponseEnvelope
//! ```
//!
//! Each context is started by a [`WorkerFactory`] and gets one reader task
//! that routes responses to pending entries by id. Each pending entry owns a
//! timer task, so it is removed on timeout even if the caller dropped its
//! [`PendingReply`]. A response that arrives for an id no longer pending is
//! logged and discarded.

mod error;
mod factory;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::clock::unix_millis;
use crate::executor::protocol::{
    RequestEnvelope, ResponseEnvelope, WorkerCommand, WorkerMessage, WorkerResult,
};

pub use error::BridgeError;
pub use factory::{ExecutorFactory, WorkerFactory};

pub const DEFAULT_RESPONSE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeSettings {
    /// How long a request may stay pending before it fails with `Timeout`.
    pub response_timeout: Duration,
    /// How long `init_worker` waits for the context's init message.
    pub ready_timeout: Duration,
}

impl Default for BridgeSettings {
    fn default() -> Self {
        Self {
            response_timeout: DEFAULT_RESPONSE_TIMEOUT,
            ready_timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

type Reply = Result<WorkerResult, BridgeError>;

/// Registry of named execution contexts plus the pending-request table.
///
/// Cheap to clone; clones share the same registry.
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

struct BridgeInner {
    factory: Arc<dyn WorkerFactory>,
    settings: BridgeSettings,
    workers: Mutex<HashMap<String, WorkerSlot>>,
    pending: Mutex<HashMap<String, PendingRequest>>,
    counter: AtomicU64,
    generation: AtomicU64,
}

struct WorkerSlot {
    generation: u64,
    outbound: mpsc::UnboundedSender<RequestEnvelope>,
    ready: watch::Receiver<bool>,
    reader: JoinHandle<()>,
    task: Option<JoinHandle<()>>,
}

struct PendingRequest {
    worker: String,
    created_at: Instant,
    respond_to: oneshot::Sender<Reply>,
    timer: JoinHandle<()>,
}

impl Bridge {
    pub fn new(factory: Arc<dyn WorkerFactory>, settings: BridgeSettings) -> Self {
        Self {
            inner: Arc::new(BridgeInner {
                factory,
                settings,
                workers: Mutex::new(HashMap::new()),
                pending: Mutex::new(HashMap::new()),
                counter: AtomicU64::new(0),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn settings(&self) -> BridgeSettings {
        self.inner.settings
    }

    /// Start the context `name` from `path` and wait until it reports ready.
    ///
    /// If `name` is already registered the existing context is kept and only
    /// its readiness is awaited; `path` is ignored in that case.
    pub async fn init_worker(&self, name: &str, path: &str) -> Result<(), BridgeError> {
        let (generation, ready) = {
            let mut workers = self.inner.workers.lock();
            match workers.get(name) {
                Some(slot) => {
                    tracing::debug!(worker = name, "Worker already registered, reusing");
                    (slot.generation, slot.ready.clone())
                }
                None => {
                    let endpoint = self.inner.factory.spawn(name, path)?;
                    let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    let (ready_tx, ready_rx) = watch::channel(false);
                    let reader = tokio::spawn(read_loop(
                        Arc::downgrade(&self.inner),
                        name.to_string(),
                        generation,
                        endpoint.inbound,
                        ready_tx,
                    ));
                    workers.insert(
                        name.to_string(),
                        WorkerSlot {
                            generation,
                            outbound: endpoint.outbound,
                            ready: ready_rx.clone(),
                            reader,
                            task: endpoint.task,
                        },
                    );
                    tracing::debug!(worker = name, path, "Worker spawned");
                    (generation, ready_rx)
                }
            }
        };

        let after = self.inner.settings.ready_timeout;
        let mut ready = ready;
        let outcome = tokio::time::timeout(after, ready.wait_for(|ready| *ready))
            .await
            .map(|seen| seen.is_ok());

        match outcome {
            Ok(true) => {
                tracing::info!(worker = name, "Worker ready");
                Ok(())
            }
            Ok(false) => {
                self.terminate_generation(name, generation);
                Err(BridgeError::Disconnected {
                    worker: name.to_string(),
                })
            }
            Err(_) => {
                tracing::warn!(worker = name, after_ms = after.as_millis() as u64, "Worker never became ready");
                self.terminate_generation(name, generation);
                Err(BridgeError::ReadyTimeout {
                    worker: name.to_string(),
                    after,
                })
            }
        }
    }

    /// Post `command` to `worker` and return a future for its reply.
    ///
    /// Fails immediately if the worker is not registered. The reply resolves
    /// with the matching response, `Timeout` after the response timeout, or
    /// `Terminated` if the worker is terminated first.
    pub fn send(&self, worker: &str, command: WorkerCommand) -> Result<PendingReply, BridgeError> {
        let outbound = self
            .inner
            .workers
            .lock()
            .get(worker)
            .map(|slot| slot.outbound.clone())
            .ok_or_else(|| BridgeError::NotInitialized {
                worker: worker.to_string(),
            })?;

        let id = format!(
            "{}-{}",
            self.inner.counter.fetch_add(1, Ordering::Relaxed) + 1,
            unix_millis()
        );
        let (respond_to, receiver) = oneshot::channel();
        {
            let mut pending = self.inner.pending.lock();
            let timer = tokio::spawn(expire(
                Arc::downgrade(&self.inner),
                id.clone(),
                self.inner.settings.response_timeout,
            ));
            pending.insert(
                id.clone(),
                PendingRequest {
                    worker: worker.to_string(),
                    created_at: Instant::now(),
                    respond_to,
                    timer,
                },
            );
        }

        tracing::trace!(worker, id = %id, action = command.name(), "Posting request");
        let envelope = RequestEnvelope {
            id: id.clone(),
            command,
        };
        if outbound.send(envelope).is_err() {
            if let Some(entry) = self.inner.pending.lock().remove(&id) {
                entry.timer.abort();
            }
            return Err(BridgeError::Disconnected {
                worker: worker.to_string(),
            });
        }

        Ok(PendingReply {
            id,
            worker: worker.to_string(),
            receiver,
        })
    }

    /// [`send`](Self::send) and await the reply.
    pub async fn request(&self, worker: &str, command: WorkerCommand) -> Reply {
        self.send(worker, command)?.await
    }

    /// Stop `worker` and reject its pending requests with `Terminated`.
    ///
    /// Returns whether the worker was registered.
    pub fn terminate(&self, worker: &str) -> bool {
        let Some(slot) = self.inner.workers.lock().remove(worker) else {
            return false;
        };
        self.shut_down(worker, slot);
        true
    }

    /// Terminate `worker` only if it is still the context started as `generation`.
    fn terminate_generation(&self, worker: &str, generation: u64) -> bool {
        let slot = {
            let mut workers = self.inner.workers.lock();
            match workers.get(worker) {
                Some(slot) if slot.generation == generation => workers.remove(worker),
                _ => None,
            }
        };
        let Some(slot) = slot else {
            tracing::debug!(worker, generation, "Worker slot replaced, leaving it running");
            return false;
        };
        self.shut_down(worker, slot);
        true
    }

    fn shut_down(&self, worker: &str, slot: WorkerSlot) {
        slot.stop();

        let rejected = self.inner.reject_pending(worker, |id| BridgeError::Terminated {
            worker: worker.to_string(),
            id,
        });
        tracing::info!(worker, rejected, "Worker terminated");
    }

    /// Terminate every registered worker. Returns how many were stopped.
    pub fn terminate_all(&self) -> usize {
        let names: Vec<String> = self.inner.workers.lock().keys().cloned().collect();
        names.iter().filter(|name| self.terminate(name)).count()
    }

    pub fn is_initialized(&self, worker: &str) -> bool {
        self.inner.workers.lock().contains_key(worker)
    }

    /// Number of requests currently awaiting a response, across all workers.
    pub fn pending_count(&self) -> usize {
        self.inner.pending.lock().len()
    }
}

impl WorkerSlot {
    fn stop(self) {
        self.reader.abort();
        if let Some(task) = self.task {
            task.abort();
        }
    }
}

impl BridgeInner {
    fn resolve(&self, worker: &str, envelope: ResponseEnvelope) {
        if envelope.id.is_empty() {
            tracing::warn!(worker, "Dropping response without id");
            return;
        }
        let Some(entry) = self.pending.lock().remove(&envelope.id) else {
            tracing::debug!(worker, id = %envelope.id, "Response for unknown or expired request");
            return;
        };
        entry.timer.abort();
        tracing::trace!(
            worker,
            id = %envelope.id,
            elapsed_ms = entry.created_at.elapsed().as_millis() as u64,
            "Response matched"
        );
        if entry.respond_to.send(Ok(envelope.result)).is_err() {
            tracing::trace!(id = %envelope.id, "Reply dropped (caller gone)");
        }
    }

    fn reject_pending<F>(&self, worker: &str, make_error: F) -> usize
    where
        F: Fn(String) -> BridgeError,
    {
        let rejected: Vec<(String, PendingRequest)> = {
            let mut pending = self.pending.lock();
            let ids: Vec<String> = pending
                .iter()
                .filter(|(_, entry)| entry.worker == worker)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter()
                .filter_map(|id| pending.remove(&id).map(|entry| (id, entry)))
                .collect()
        };
        let count = rejected.len();
        for (id, entry) in rejected {
            entry.timer.abort();
            if entry.respond_to.send(Err(make_error(id))).is_err() {
                tracing::trace!(worker, "Rejection dropped (caller gone)");
            }
        }
        count
    }
}

impl Drop for BridgeInner {
    fn drop(&mut self) {
        for (_, slot) in self.workers.get_mut().drain() {
            slot.stop();
        }
        for (_, entry) in self.pending.get_mut().drain() {
            entry.timer.abort();
        }
    }
}

async fn read_loop(
    inner: Weak<BridgeInner>,
    worker: String,
    generation: u64,
    mut inbound: mpsc::UnboundedReceiver<WorkerMessage>,
    ready: watch::Sender<bool>,
) {
    while let Some(message) = inbound.recv().await {
        match message {
            WorkerMessage::Init { message, .. } => {
                tracing::debug!(worker = %worker, message = %message, "Worker init received");
                ready.send_replace(true);
            }
            WorkerMessage::Response(envelope) => {
                let Some(inner) = inner.upgrade() else { return };
                inner.resolve(&worker, envelope);
            }
        }
    }

    let Some(inner) = inner.upgrade() else { return };
    tracing::warn!(worker = %worker, "Worker channel closed");
    let removed = {
        let mut workers = inner.workers.lock();
        match workers.get(&worker) {
            Some(slot) if slot.generation == generation => workers.remove(&worker),
            _ => None,
        }
    };
    if let Some(slot) = removed {
        slot.stop();
        inner.reject_pending(&worker, |_| BridgeError::Disconnected {
            worker: worker.clone(),
        });
    }
}

async fn expire(inner: Weak<BridgeInner>, id: String, after: Duration) {
    tokio::time::sleep(after).await;
    let Some(inner) = inner.upgrade() else { return };
    let Some(entry) = inner.pending.lock().remove(&id) else {
        return;
    };
    tracing::warn!(worker = %entry.worker, id = %id, "Request timed out");
    if entry
        .respond_to
        .send(Err(BridgeError::Timeout { id, after }))
        .is_err()
    {
        tracing::trace!("Timeout dropped (caller gone)");
    }
}

/// Reply to one [`Bridge::send`].
pub struct PendingReply {
    id: String,
    worker: String,
    receiver: oneshot::Receiver<Reply>,
}

impl PendingReply {
    /// Correlation id carried by the request envelope.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Future for PendingReply {
    type Output = Reply;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.receiver).poll(cx).map(|received| {
            received.unwrap_or_else(|_| {
                Err(BridgeError::Disconnected {
                    worker: this.worker.clone(),
                })
            })
        })
    }
}
