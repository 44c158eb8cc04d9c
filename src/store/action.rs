//! Actions: the only way to change the state tree.
//!
//! Every action has a namespaced type string `domain/verb` and an optional
//! payload. In Rust they are a tagged union, one sub-enum per domain, so each
//! slice reducer can match its domain exhaustively. Untyped `{type, payload}`
//! pairs coming from outside go through [`RawAction`] and are validated before
//! they reach the store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::model::{Incident, IncidentId, IncidentPatch};

use super::error::ValidationError;
use super::state::{ErrorInfo, Notification};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", content = "payload", rename_all = "camelCase")]
pub enum AppAction {
    SetLoading(bool),
    SetError(ErrorInfo),
    ClearError,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", content = "payload", rename_all = "camelCase")]
pub enum IncidentAction {
    SetIncidents(Vec<Incident>),
    AddIncident(Incident),
    UpdateIncident(IncidentPatch),
    DeleteIncident(IncidentId),
    SetCurrentIncident(Option<Incident>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", content = "payload", rename_all = "camelCase")]
pub enum NotificationAction {
    AddNotification(Notification),
    RemoveNotification(u64),
    MarkDisplayed(u64),
    ClearNotifications,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "verb", content = "payload", rename_all = "camelCase")]
pub enum UiAction {
    ToggleDarkMode,
    SetDarkMode(bool),
    ToggleMenu,
    SetMenuOpen(bool),
    SetFilterStatus(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    App(AppAction),
    Incidents(IncidentAction),
    Notifications(NotificationAction),
    Ui(UiAction),
}

impl Action {
    pub fn domain(&self) -> &'static str {
        match self {
            Action::App(_) => "app",
            Action::Incidents(_) => "incidents",
            Action::Notifications(_) => "notifications",
            Action::Ui(_) => "ui",
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Action::App(action) => match action {
                AppAction::SetLoading(_) => "setLoading",
                AppAction::SetError(_) => "setError",
                AppAction::ClearError => "clearError",
            },
            Action::Incidents(action) => match action {
                IncidentAction::SetIncidents(_) => "setIncidents",
                IncidentAction::AddIncident(_) => "addIncident",
                IncidentAction::UpdateIncident(_) => "updateIncident",
                IncidentAction::DeleteIncident(_) => "deleteIncident",
                IncidentAction::SetCurrentIncident(_) => "setCurrentIncident",
            },
            Action::Notifications(action) => match action {
                NotificationAction::AddNotification(_) => "addNotification",
                NotificationAction::RemoveNotification(_) => "removeNotification",
                NotificationAction::MarkDisplayed(_) => "markDisplayed",
                NotificationAction::ClearNotifications => "clearNotifications",
            },
            Action::Ui(action) => match action {
                UiAction::ToggleDarkMode => "toggleDarkMode",
                UiAction::SetDarkMode(_) => "setDarkMode",
                UiAction::ToggleMenu => "toggleMenu",
                UiAction::SetMenuOpen(_) => "setMenuOpen",
                UiAction::SetFilterStatus(_) => "setFilterStatus",
            },
        }
    }

    /// Namespaced type string, e.g. `incidents/updateIncident`.
    pub fn action_type(&self) -> String {
        format!("{}/{}", self.domain(), self.verb())
    }

    /// Untyped `{type, payload}` form of this action.
    pub fn to_raw(&self) -> RawAction {
        let encoded = match self {
            Action::App(action) => serde_json::to_value(action),
            Action::Incidents(action) => serde_json::to_value(action),
            Action::Notifications(action) => serde_json::to_value(action),
            Action::Ui(action) => serde_json::to_value(action),
        };
        let payload = encoded
            .ok()
            .and_then(|mut value| value.get_mut("payload").map(Value::take))
            .unwrap_or(Value::Null);

        RawAction {
            action_type: Some(self.action_type()),
            payload,
        }
    }
}

impl From<AppAction> for Action {
    fn from(action: AppAction) -> Self {
        Action::App(action)
    }
}

impl From<IncidentAction> for Action {
    fn from(action: IncidentAction) -> Self {
        Action::Incidents(action)
    }
}

impl From<NotificationAction> for Action {
    fn from(action: NotificationAction) -> Self {
        Action::Notifications(action)
    }
}

impl From<UiAction> for Action {
    fn from(action: UiAction) -> Self {
        Action::Ui(action)
    }
}

/// Untyped action as it arrives from outside the typed world.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub action_type: Option<String>,
    #[serde(default)]
    pub payload: Value,
}

impl RawAction {
    pub fn new(action_type: impl Into<String>, payload: Value) -> Self {
        Self {
            action_type: Some(action_type.into()),
            payload,
        }
    }

    /// Validate and convert into a typed [`Action`].
    pub fn parse(self) -> Result<Action, ValidationError> {
        let action_type = self
            .action_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ValidationError::MissingType)?
            .to_string();

        let unknown = || ValidationError::UnknownType {
            action_type: action_type.clone(),
        };
        let (domain, verb) = action_type.split_once('/').ok_or_else(unknown)?;

        let (verbs, decoder): (&[&str], fn(Value) -> Result<Action, serde_json::Error>) =
            match domain {
                "app" => (APP_VERBS, |v| decode::<AppAction>(v).map(Action::App)),
                "incidents" => (INCIDENT_VERBS, |v| {
                    decode::<IncidentAction>(v).map(Action::Incidents)
                }),
                "notifications" => (NOTIFICATION_VERBS, |v| {
                    decode::<NotificationAction>(v).map(Action::Notifications)
                }),
                "ui" => (UI_VERBS, |v| decode::<UiAction>(v).map(Action::Ui)),
                _ => return Err(unknown()),
            };

        if !verbs.contains(&verb) {
            return Err(unknown());
        }

        let mut tagged = Map::new();
        tagged.insert("verb".to_string(), Value::String(verb.to_string()));
        tagged.insert("payload".to_string(), self.payload);

        decoder(Value::Object(tagged)).map_err(|e| ValidationError::InvalidPayload {
            action_type: action_type.clone(),
            reason: e.to_string(),
        })
    }
}

const APP_VERBS: &[&str] = &["setLoading", "setError", "clearError"];
const INCIDENT_VERBS: &[&str] = &[
    "setIncidents",
    "addIncident",
    "updateIncident",
    "deleteIncident",
    "setCurrentIncident",
];
const NOTIFICATION_VERBS: &[&str] = &[
    "addNotification",
    "removeNotification",
    "markDisplayed",
    "clearNotifications",
];
const UI_VERBS: &[&str] = &[
    "toggleDarkMode",
    "setDarkMode",
    "toggleMenu",
    "setMenuOpen",
    "setFilterStatus",
];

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, serde_json::Error> {
    serde_json::from_value(value)
}

/// Anything the store accepts for dispatch.
///
/// Typed actions always convert; raw actions are validated and may be rejected.
pub trait IntoAction {
    fn into_action(self) -> Result<Action, ValidationError>;
}

impl IntoAction for Action {
    fn into_action(self) -> Result<Action, ValidationError> {
        Ok(self)
    }
}

impl IntoAction for RawAction {
    fn into_action(self) -> Result<Action, ValidationError> {
        self.parse()
    }
}

impl IntoAction for AppAction {
    fn into_action(self) -> Result<Action, ValidationError> {
        Ok(self.into())
    }
}

impl IntoAction for IncidentAction {
    fn into_action(self) -> Result<Action, ValidationError> {
        Ok(self.into())
    }
}

impl IntoAction for NotificationAction {
    fn into_action(self) -> Result<Action, ValidationError> {
        Ok(self.into())
    }
}

impl IntoAction for UiAction {
    fn into_action(self) -> Result<Action, ValidationError> {
        Ok(self.into())
    }
}

/// An action as seen by middlewares and reducers, stamped by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionEnvelope {
    /// Per-store monotonic counter, starting at 1.
    pub sequence_id: u64,
    /// Unix milliseconds at dispatch time.
    pub timestamp: u64,
    pub action: Action,
}
