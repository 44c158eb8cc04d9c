//! Observable state container.
//!
//! Dispatch pipeline for one action:
//!
//! ```text
//! validate ──→ stamp ──→ middlewares (concurrent) ──→ root_reduce ──→ notify
//!    │
//!    └─ synchronous error, nothing else runs
//! ```
//!
//! Locks are only taken for the state swap and for copying the subscriber and
//! middleware lists; none is held across an `.await`.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use futures_util::future::{join_all, BoxFuture};
use futures_util::FutureExt;
use parking_lot::RwLock;

use crate::clock::unix_millis;

use super::action::{ActionEnvelope, IntoAction};
use super::error::{MiddlewareFailure, StoreError};
use super::middleware::Middleware;
use super::reducer::root_reduce;
use super::state::AppState;

/// Callback invoked with the full new state after every dispatch.
pub type Subscriber = Arc<dyn Fn(&Arc<AppState>) + Send + Sync>;

/// Deferred completion of one dispatch.
///
/// Resolves with the state produced by this dispatch once every middleware
/// has settled and subscribers have been notified.
pub type Dispatch = BoxFuture<'static, Result<Arc<AppState>, StoreError>>;

#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    state: RwLock<Arc<AppState>>,
    subscribers: RwLock<Vec<Subscriber>>,
    middlewares: RwLock<Vec<Arc<dyn Middleware>>>,
    sequence: AtomicU64,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                state: RwLock::new(Arc::new(initial)),
                subscribers: RwLock::new(Vec::new()),
                middlewares: RwLock::new(Vec::new()),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Snapshot of the current state. Never waits on a dispatch in progress.
    pub fn get_state(&self) -> Arc<AppState> {
        Arc::clone(&self.inner.state.read())
    }

    /// Register a middleware for all subsequent dispatches.
    pub fn apply_middleware(&self, middleware: Arc<dyn Middleware>) {
        self.inner.middlewares.write().push(middleware);
    }

    /// Register a subscriber. Subscribing the same `Arc` twice is a no-op.
    pub fn subscribe(&self, subscriber: Subscriber) -> Subscription {
        {
            let mut subscribers = self.inner.subscribers.write();
            if !subscribers.iter().any(|existing| same_subscriber(existing, &subscriber)) {
                subscribers.push(Arc::clone(&subscriber));
            }
        }
        Subscription {
            store: Arc::downgrade(&self.inner),
            subscriber,
        }
    }

    /// Remove a subscriber by identity. Returns whether it was registered.
    pub fn unsubscribe(&self, subscriber: &Subscriber) -> bool {
        let mut subscribers = self.inner.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|existing| !same_subscriber(existing, subscriber));
        subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Dispatch an action.
    ///
    /// Validation happens here, synchronously: a malformed action is rejected
    /// before any middleware or reducer runs. The returned future drives the
    /// rest of the pipeline and must be awaited for the update to happen.
    ///
    /// Overlapping dispatches apply their state updates in completion order,
    /// not call order.
    pub fn dispatch<A: IntoAction>(&self, action: A) -> Result<Dispatch, StoreError> {
        let action = action.into_action()?;
        let envelope = ActionEnvelope {
            sequence_id: self.inner.sequence.fetch_add(1, Ordering::SeqCst) + 1,
            timestamp: unix_millis(),
            action,
        };
        let store = self.clone();
        Ok(async move { store.run_pipeline(envelope).await }.boxed())
    }

    async fn run_pipeline(self, envelope: ActionEnvelope) -> Result<Arc<AppState>, StoreError> {
        let middlewares: Vec<Arc<dyn Middleware>> = self.inner.middlewares.read().clone();

        let outcomes = join_all(middlewares.iter().map(|middleware| {
            let handled = AssertUnwindSafe(middleware.handle(&self, &envelope)).catch_unwind();
            async move { (middleware, handled.await) }
        }))
        .await;

        let failures: Vec<MiddlewareFailure> = outcomes
            .into_iter()
            .filter_map(|(middleware, outcome)| {
                let message = match outcome {
                    Ok(Ok(())) => return None,
                    Ok(Err(e)) => e.to_string(),
                    Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
                };
                tracing::error!(
                    middleware = middleware.name(),
                    sequence_id = envelope.sequence_id,
                    error = %message,
                    "Middleware failed"
                );
                Some(MiddlewareFailure {
                    middleware: middleware.name().to_string(),
                    message,
                })
            })
            .collect();

        let next = {
            let mut state = self.inner.state.write();
            let next = Arc::new(root_reduce(&state, &envelope.action));
            *state = Arc::clone(&next);
            next
        };

        self.notify(&next);

        if failures.is_empty() {
            Ok(next)
        } else {
            Err(StoreError::Middleware {
                sequence_id: envelope.sequence_id,
                failures,
            })
        }
    }

    fn notify(&self, state: &Arc<AppState>) {
        let subscribers: Vec<Subscriber> = self.inner.subscribers.read().clone();
        for (index, subscriber) in subscribers.iter().enumerate() {
            let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| subscriber(state)));
            if let Err(panic) = outcome {
                tracing::error!(
                    subscriber = index,
                    error = %panic_message(panic.as_ref()),
                    "Subscriber panicked"
                );
            }
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new(AppState::default())
    }
}

/// Handle returned by [`Store::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
pub struct Subscription {
    store: Weak<StoreInner>,
    subscriber: Subscriber,
}

impl Subscription {
    pub fn unsubscribe(self) -> bool {
        let Some(inner) = self.store.upgrade() else {
            return false;
        };
        Store { inner }.unsubscribe(&self.subscriber)
    }
}

fn same_subscriber(a: &Subscriber, b: &Subscriber) -> bool {
    // Compare data pointers only; vtable pointers are not unique.
    std::ptr::eq(
        Arc::as_ptr(a) as *const (),
        Arc::as_ptr(b) as *const (),
    )
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
