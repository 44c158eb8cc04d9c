//! Worker factory whose contexts are driven by the test.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use incident_desk::bridge::{BridgeError, WorkerFactory};
use incident_desk::executor::protocol::{
    RequestEnvelope, ResponseEnvelope, WorkerEndpoint, WorkerMessage, WorkerResult,
};
use parking_lot::Mutex;
use tokio::sync::mpsc;

/// The far side of one spawned context.
pub struct ScriptedWorker {
    pub requests: mpsc::UnboundedReceiver<RequestEnvelope>,
    pub replies: mpsc::UnboundedSender<WorkerMessage>,
}

impl ScriptedWorker {
    pub fn announce(&self) {
        self.replies.send(WorkerMessage::ready("scripted")).unwrap();
    }

    pub async fn next_request(&mut self) -> RequestEnvelope {
        self.requests.recv().await.expect("bridge closed the channel")
    }

    pub fn reply(&self, id: &str, result: WorkerResult) {
        // The bridge may already be gone in shutdown tests.
        let _ = self.replies.send(WorkerMessage::Response(ResponseEnvelope {
            id: id.to_string(),
            result,
        }));
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    /// Send the init message as soon as the context is spawned.
    Announce,
    /// Leave readiness to the test.
    Silent,
    /// Refuse to spawn.
    Fail,
}

pub struct ScriptedFactory {
    startup: Startup,
    spawned: AtomicUsize,
    handoff: Mutex<mpsc::UnboundedSender<ScriptedWorker>>,
}

impl ScriptedFactory {
    pub fn new(startup: Startup) -> (Arc<Self>, mpsc::UnboundedReceiver<ScriptedWorker>) {
        let (handoff, workers) = mpsc::unbounded_channel();
        let factory = Arc::new(Self {
            startup,
            spawned: AtomicUsize::new(0),
            handoff: Mutex::new(handoff),
        });
        (factory, workers)
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }
}

impl WorkerFactory for ScriptedFactory {
    fn spawn(&self, name: &str, path: &str) -> Result<WorkerEndpoint, BridgeError> {
        if self.startup == Startup::Fail {
            return Err(BridgeError::SpawnFailed {
                worker: name.to_string(),
                path: path.to_string(),
                reason: "scripted failure".to_string(),
            });
        }
        self.spawned.fetch_add(1, Ordering::SeqCst);

        let (outbound, requests) = mpsc::unbounded_channel();
        let (replies, inbound) = mpsc::unbounded_channel();
        let worker = ScriptedWorker { requests, replies };
        if self.startup == Startup::Announce {
            worker.announce();
        }
        let _ = self.handoff.lock().send(worker);

        Ok(WorkerEndpoint {
            outbound,
            inbound,
            task: None,
        })
    }
}
