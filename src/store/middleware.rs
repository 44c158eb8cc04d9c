//! Middlewares intercept every dispatched action before the reducer runs.
//!
//! All middlewares registered on a store run concurrently for one dispatch;
//! the state update waits until every one of them has settled.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use super::action::{Action, ActionEnvelope, NotificationAction};
use super::container::Store;
use super::error::MiddlewareError;

#[async_trait]
pub trait Middleware: Send + Sync {
    /// Name used when reporting failures.
    fn name(&self) -> &str;

    /// Perform side effects for `envelope`. Returning resolves this
    /// middleware's share of the dispatch.
    async fn handle(&self, store: &Store, envelope: &ActionEnvelope)
        -> Result<(), MiddlewareError>;
}

/// Middleware built from an async closure.
pub struct FnMiddleware<F> {
    name: String,
    handler: F,
}

/// Wrap an async closure as a middleware.
pub fn from_fn<F, Fut>(name: impl Into<String>, handler: F) -> Arc<dyn Middleware>
where
    F: Fn(Store, ActionEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), MiddlewareError>> + Send + 'static,
{
    Arc::new(FnMiddleware {
        name: name.into(),
        handler,
    })
}

#[async_trait]
impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Store, ActionEnvelope) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), MiddlewareError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(
        &self,
        store: &Store,
        envelope: &ActionEnvelope,
    ) -> Result<(), MiddlewareError> {
        (self.handler)(store.clone(), envelope.clone()).await
    }
}

/// Logs every action at debug level.
pub struct LoggingMiddleware;

#[async_trait]
impl Middleware for LoggingMiddleware {
    fn name(&self) -> &str {
        "logging"
    }

    async fn handle(
        &self,
        _store: &Store,
        envelope: &ActionEnvelope,
    ) -> Result<(), MiddlewareError> {
        tracing::debug!(
            sequence_id = envelope.sequence_id,
            timestamp = envelope.timestamp,
            action = %envelope.action.action_type(),
            "Dispatching action"
        );
        Ok(())
    }
}

/// Removes each notification once its duration has elapsed.
///
/// The removal is a regular `notifications/removeNotification` dispatch issued
/// from a background task, so the dispatch that added the notification is not
/// held up by the timer.
pub struct AutoDismissMiddleware;

#[async_trait]
impl Middleware for AutoDismissMiddleware {
    fn name(&self) -> &str {
        "auto-dismiss"
    }

    async fn handle(
        &self,
        store: &Store,
        envelope: &ActionEnvelope,
    ) -> Result<(), MiddlewareError> {
        let Action::Notifications(NotificationAction::AddNotification(notification)) =
            &envelope.action
        else {
            return Ok(());
        };
        if notification.duration == 0 {
            return Ok(());
        }

        let store = store.clone();
        let id = notification.id;
        let after = Duration::from_millis(notification.duration);
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            match store.dispatch(NotificationAction::RemoveNotification(id)) {
                Ok(dispatch) => {
                    if let Err(e) = dispatch.await {
                        tracing::warn!(notification = id, error = %e, "Auto-dismiss dispatch failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(notification = id, error = %e, "Auto-dismiss rejected");
                }
            }
        });
        Ok(())
    }
}
