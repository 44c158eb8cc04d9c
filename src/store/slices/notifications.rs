use std::collections::VecDeque;

use crate::store::action::{Action, IncidentAction, NotificationAction};
use crate::store::reducer::SliceReducer;
use crate::store::state::{AppState, Notification};

/// Reducer for the notification queue.
///
/// Also listens to `incidents/deleteIncident` so notifications about an
/// incident that no longer exists are dropped in the same dispatch.
pub struct NotificationsReducer;

impl SliceReducer for NotificationsReducer {
    type Slice = VecDeque<Notification>;

    fn reduce(mut slice: Self::Slice, action: &Action, _previous: &AppState) -> Self::Slice {
        match action {
            Action::Notifications(action) => match action {
                NotificationAction::AddNotification(notification) => {
                    if !slice.iter().any(|existing| existing.id == notification.id) {
                        slice.push_back(notification.clone());
                    }
                    slice
                }
                NotificationAction::RemoveNotification(id) => {
                    slice.retain(|notification| notification.id != *id);
                    slice
                }
                NotificationAction::MarkDisplayed(id) => {
                    if let Some(notification) = slice.iter_mut().find(|n| n.id == *id) {
                        notification.displayed = true;
                    }
                    slice
                }
                NotificationAction::ClearNotifications => VecDeque::new(),
            },
            Action::Incidents(IncidentAction::DeleteIncident(id)) => {
                slice.retain(|notification| notification.incident_id != Some(*id));
                slice
            }
            _ => slice,
        }
    }
}
