//! The state tree held by the [`Store`](super::Store).

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::{Incident, IncidentId};

/// Value of `ui.filter_status` that shows every incident.
pub const FILTER_ALL: &str = "all";

/// Root of the state tree. Each field is an independently reduced slice.
///
/// The store hands out `Arc<AppState>` snapshots and swaps in a fresh `Arc`
/// on every dispatch, so `Arc::ptr_eq` between two snapshots tells whether a
/// dispatch happened in between.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub loading: bool,
    pub incidents: Vec<Incident>,
    pub current_incident: Option<Incident>,
    pub notifications: VecDeque<Notification>,
    pub error: Option<ErrorInfo>,
    pub ui: UiPrefs,
}

impl AppState {
    /// Initial state with the persisted dark-mode flag applied.
    pub fn with_dark_mode(dark_mode: bool) -> Self {
        Self {
            ui: UiPrefs {
                dark_mode,
                ..UiPrefs::default()
            },
            ..Self::default()
        }
    }

    /// Incidents matching the current `ui.filter_status`.
    pub fn visible_incidents(&self) -> Vec<&Incident> {
        self.incidents
            .iter()
            .filter(|incident| {
                self.ui.filter_status == FILTER_ALL
                    || incident.status.as_str() == self.ui.filter_status
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiPrefs {
    pub dark_mode: bool,
    pub menu_open: bool,
    pub filter_status: String,
}

impl Default for UiPrefs {
    fn default() -> Self {
        Self {
            dark_mode: false,
            menu_open: false,
            filter_status: FILTER_ALL.to_string(),
        }
    }
}

/// Normalized error recorded in the `error` slice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub message: String,
    pub code: String,
    /// Unix milliseconds at which the error was normalized.
    pub timestamp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

impl NotificationKind {
    /// How long a notification of this kind stays on screen.
    pub fn default_duration_ms(&self) -> u64 {
        match self {
            Self::Success => 3_000,
            Self::Info => 3_000,
            Self::Warning => 4_000,
            Self::Error => 5_000,
        }
    }
}

/// Entry in the notification queue.
///
/// The queue only grows until a `removeNotification` (or `clearNotifications`)
/// action prunes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: u64,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub duration: u64,
    #[serde(default)]
    pub displayed: bool,
    /// Incident this notification is about; deleting the incident drops it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_id: Option<IncidentId>,
}
