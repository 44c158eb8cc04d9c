//! Centralized observable state.
//!
//! # Architecture
//!
//! ```text
//! dispatch(Action) ──→ Middlewares ──→ root_reduce ──→ AppState ──→ Subscribers
//!       ↑                                                              │
//!       └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - `state.rs` - The state tree and its slice types
//! - `action.rs` - Typed actions, raw `{type, payload}` validation, envelopes
//! - `reducer.rs` + `slices/` - Pure per-slice transitions
//! - `middleware.rs` - Side-effect hooks run before each state update
//! - `container.rs` - The `Store` itself

pub mod action;
pub mod creators;
pub mod middleware;
pub mod reducer;
pub mod slices;
pub mod state;

mod container;
mod error;

pub use action::{
    Action, ActionEnvelope, AppAction, IncidentAction, IntoAction, NotificationAction, RawAction,
    UiAction,
};
pub use container::{Dispatch, Store, Subscriber, Subscription};
pub use creators::Notifier;
pub use error::{MiddlewareError, MiddlewareFailure, StoreError, ValidationError};
pub use middleware::{AutoDismissMiddleware, LoggingMiddleware, Middleware};
pub use state::{AppState, ErrorInfo, Notification, NotificationKind, UiPrefs};
