//! Reducer composition.
//!
//! ```text
//! Action ──→ root_reduce ──┬─→ LoadingReducer        ──→ loading
//!                          ├─→ IncidentsReducer      ──→ incidents
//!                          ├─→ CurrentIncidentReducer──→ current_incident
//!                          ├─→ NotificationsReducer  ──→ notifications
//!                          ├─→ ErrorReducer          ──→ error
//!                          └─→ UiReducer             ──→ ui
//! ```
//!
//! Every slice reducer receives the previous full state, never the state
//! being built for this action, so sibling slices cannot observe each
//! other's in-flight updates.

use super::action::Action;
use super::slices::{
    CurrentIncidentReducer, ErrorReducer, IncidentsReducer, LoadingReducer,
    NotificationsReducer, UiReducer,
};
use super::state::AppState;

/// Pure transition function for one slice of the state tree.
///
/// `(slice, action, previous full state) -> next slice`. Actions from other
/// domains must return the slice unchanged.
pub trait SliceReducer {
    type Slice;

    fn reduce(slice: Self::Slice, action: &Action, previous: &AppState) -> Self::Slice;
}

/// Fan an action out to every slice reducer and assemble the next state.
pub fn root_reduce(previous: &AppState, action: &Action) -> AppState {
    AppState {
        loading: LoadingReducer::reduce(previous.loading, action, previous),
        incidents: IncidentsReducer::reduce(previous.incidents.clone(), action, previous),
        current_incident: CurrentIncidentReducer::reduce(
            previous.current_incident.clone(),
            action,
            previous,
        ),
        notifications: NotificationsReducer::reduce(
            previous.notifications.clone(),
            action,
            previous,
        ),
        error: ErrorReducer::reduce(previous.error.clone(), action, previous),
        ui: UiReducer::reduce(previous.ui.clone(), action, previous),
    }
}
