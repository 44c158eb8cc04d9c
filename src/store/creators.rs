//! Action creators.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::model::{Incident, IncidentId, IncidentPatch};

use super::action::{Action, AppAction, IncidentAction, NotificationAction, UiAction};
use super::state::{ErrorInfo, Notification, NotificationKind};

pub fn set_loading(loading: bool) -> Action {
    AppAction::SetLoading(loading).into()
}

pub fn set_error(error: ErrorInfo) -> Action {
    AppAction::SetError(error).into()
}

pub fn clear_error() -> Action {
    AppAction::ClearError.into()
}

pub fn set_incidents(incidents: Vec<Incident>) -> Action {
    IncidentAction::SetIncidents(incidents).into()
}

pub fn add_incident(incident: Incident) -> Action {
    IncidentAction::AddIncident(incident).into()
}

pub fn update_incident(patch: IncidentPatch) -> Action {
    IncidentAction::UpdateIncident(patch).into()
}

pub fn delete_incident(id: IncidentId) -> Action {
    IncidentAction::DeleteIncident(id).into()
}

pub fn set_current_incident(incident: Option<Incident>) -> Action {
    IncidentAction::SetCurrentIncident(incident).into()
}

pub fn remove_notification(id: u64) -> Action {
    NotificationAction::RemoveNotification(id).into()
}

pub fn toggle_dark_mode() -> Action {
    UiAction::ToggleDarkMode.into()
}

pub fn set_dark_mode(dark_mode: bool) -> Action {
    UiAction::SetDarkMode(dark_mode).into()
}

pub fn set_filter_status(filter_status: impl Into<String>) -> Action {
    UiAction::SetFilterStatus(filter_status.into()).into()
}

/// Builds `notifications/addNotification` actions with unique ids.
///
/// Ids come from a per-instance monotonic counter starting at 1, so one
/// `Notifier` should be shared by everything feeding the same store.
#[derive(Debug, Default)]
pub struct Notifier {
    last_id: AtomicU64,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notify(&self, message: impl Into<String>, kind: NotificationKind) -> Action {
        self.build(message.into(), kind, None)
    }

    /// Notification tied to an incident; deleting the incident drops it.
    pub fn notify_about(
        &self,
        incident_id: IncidentId,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Action {
        self.build(message.into(), kind, Some(incident_id))
    }

    pub fn success(&self, message: impl Into<String>) -> Action {
        self.notify(message, NotificationKind::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> Action {
        self.notify(message, NotificationKind::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> Action {
        self.notify(message, NotificationKind::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> Action {
        self.notify(message, NotificationKind::Info)
    }

    fn build(
        &self,
        message: String,
        kind: NotificationKind,
        incident_id: Option<IncidentId>,
    ) -> Action {
        let id = self.last_id.fetch_add(1, Ordering::Relaxed) + 1;
        NotificationAction::AddNotification(Notification {
            id,
            message,
            kind,
            duration: kind.default_duration_ms(),
            displayed: false,
            incident_id,
        })
        .into()
    }
}
