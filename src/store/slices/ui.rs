use crate::store::action::{Action, UiAction};
use crate::store::reducer::SliceReducer;
use crate::store::state::{AppState, UiPrefs};

pub struct UiReducer;

impl SliceReducer for UiReducer {
    type Slice = UiPrefs;

    fn reduce(slice: UiPrefs, action: &Action, _previous: &AppState) -> UiPrefs {
        let Action::Ui(action) = action else {
            return slice;
        };
        match action {
            UiAction::ToggleDarkMode => UiPrefs {
                dark_mode: !slice.dark_mode,
                ..slice
            },
            UiAction::SetDarkMode(dark_mode) => UiPrefs {
                dark_mode: *dark_mode,
                ..slice
            },
            UiAction::ToggleMenu => UiPrefs {
                menu_open: !slice.menu_open,
                ..slice
            },
            UiAction::SetMenuOpen(menu_open) => UiPrefs {
                menu_open: *menu_open,
                ..slice
            },
            UiAction::SetFilterStatus(filter_status) => UiPrefs {
                filter_status: filter_status.clone(),
                ..slice
            },
        }
    }
}
