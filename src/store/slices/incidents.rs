use crate::model::Incident;
use crate::store::action::{Action, IncidentAction};
use crate::store::reducer::SliceReducer;
use crate::store::state::AppState;

/// Reducer for the ordered incident list.
///
/// Appends keep insertion order; only `updateIncident` and `deleteIncident`
/// touch existing elements.
pub struct IncidentsReducer;

impl SliceReducer for IncidentsReducer {
    type Slice = Vec<Incident>;

    fn reduce(mut slice: Self::Slice, action: &Action, _previous: &AppState) -> Self::Slice {
        let Action::Incidents(action) = action else {
            return slice;
        };
        match action {
            IncidentAction::SetIncidents(incidents) => incidents.clone(),
            IncidentAction::AddIncident(incident) => {
                slice.push(incident.clone());
                slice
            }
            IncidentAction::UpdateIncident(patch) => slice
                .into_iter()
                .map(|incident| {
                    if incident.id == patch.id {
                        patch.apply(incident)
                    } else {
                        incident
                    }
                })
                .collect(),
            IncidentAction::DeleteIncident(id) => {
                slice.retain(|incident| incident.id != *id);
                slice
            }
            IncidentAction::SetCurrentIncident(_) => slice,
        }
    }
}

/// Reducer for the incident currently open in the detail view.
///
/// Follows updates and deletions of the same id so it never shows stale data.
pub struct CurrentIncidentReducer;

impl SliceReducer for CurrentIncidentReducer {
    type Slice = Option<Incident>;

    fn reduce(slice: Self::Slice, action: &Action, _previous: &AppState) -> Self::Slice {
        let Action::Incidents(action) = action else {
            return slice;
        };
        match action {
            IncidentAction::SetCurrentIncident(incident) => incident.clone(),
            IncidentAction::UpdateIncident(patch) => match slice {
                Some(current) if current.id == patch.id => Some(patch.apply(current)),
                other => other,
            },
            IncidentAction::DeleteIncident(id) => slice.filter(|current| current.id != *id),
            IncidentAction::SetIncidents(incidents) => match slice {
                // Refresh from the reloaded list when it still contains the open incident.
                Some(current) => Some(
                    incidents
                        .iter()
                        .find(|incident| incident.id == current.id)
                        .cloned()
                        .unwrap_or(current),
                ),
                None => None,
            },
            IncidentAction::AddIncident(_) => slice,
        }
    }
}
