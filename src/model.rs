//! Incident domain types shared by the store, the API facade and the CLI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub type IncidentId = u64;

/// Lifecycle status of an incident.
///
/// The wire values are the ones the incident API speaks. Once published,
/// do not rename them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IncidentStatus {
    #[default]
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "en_progreso")]
    InProgress,
    #[serde(rename = "resuelto")]
    Resolved,
}

impl IncidentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pendiente",
            Self::InProgress => "en_progreso",
            Self::Resolved => "resuelto",
        }
    }

    pub fn all() -> &'static [IncidentStatus] {
        &[Self::Pending, Self::InProgress, Self::Resolved]
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| {
                format!(
                    "unknown incident status '{}' (expected one of: pendiente, en_progreso, resuelto)",
                    s
                )
            })
    }
}

/// An incident as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: IncidentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl Incident {
    /// Minimal incident with only an id and status, everything else defaulted.
    pub fn new(id: IncidentId, status: IncidentStatus) -> Self {
        Self {
            id,
            title: String::new(),
            description: String::new(),
            status,
            priority: None,
            location: None,
            reported_by: None,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Partial update addressed to one incident. `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncidentPatch {
    pub id: IncidentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IncidentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl IncidentPatch {
    pub fn status(id: IncidentId, status: IncidentStatus) -> Self {
        Self {
            id,
            status: Some(status),
            ..Self::default()
        }
    }

    /// Full replacement patch built from an incident the server returned.
    pub fn from_incident(incident: &Incident) -> Self {
        Self {
            id: incident.id,
            title: Some(incident.title.clone()),
            description: Some(incident.description.clone()),
            status: Some(incident.status),
            priority: incident.priority.clone(),
            location: incident.location.clone(),
            updated_at: incident.updated_at.clone(),
        }
    }

    /// Overlay the patch onto `incident`. Applying the same patch twice
    /// yields the same incident as applying it once.
    pub fn apply(&self, mut incident: Incident) -> Incident {
        if let Some(title) = &self.title {
            incident.title = title.clone();
        }
        if let Some(description) = &self.description {
            incident.description = description.clone();
        }
        if let Some(status) = self.status {
            incident.status = status;
        }
        if let Some(priority) = &self.priority {
            incident.priority = Some(priority.clone());
        }
        if let Some(location) = &self.location {
            incident.location = Some(location.clone());
        }
        if let Some(updated_at) = &self.updated_at {
            incident.updated_at = Some(updated_at.clone());
        }
        incident
    }
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewIncident {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reported_by: Option<String>,
}
