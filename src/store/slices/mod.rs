//! One reducer per slice of [`AppState`](super::AppState).

mod app;
mod incidents;
mod notifications;
mod ui;

pub use app::{ErrorReducer, LoadingReducer};
pub use incidents::{CurrentIncidentReducer, IncidentsReducer};
pub use notifications::NotificationsReducer;
pub use ui::UiReducer;
