use crate::store::action::{Action, AppAction};
use crate::store::reducer::SliceReducer;
use crate::store::state::{AppState, ErrorInfo};

pub struct LoadingReducer;

impl SliceReducer for LoadingReducer {
    type Slice = bool;

    fn reduce(slice: bool, action: &Action, _previous: &AppState) -> bool {
        let Action::App(action) = action else {
            return slice;
        };
        match action {
            AppAction::SetLoading(loading) => *loading,
            AppAction::SetError(_) | AppAction::ClearError => slice,
        }
    }
}

pub struct ErrorReducer;

impl SliceReducer for ErrorReducer {
    type Slice = Option<ErrorInfo>;

    fn reduce(slice: Self::Slice, action: &Action, _previous: &AppState) -> Self::Slice {
        let Action::App(action) = action else {
            return slice;
        };
        match action {
            AppAction::SetError(error) => Some(error.clone()),
            AppAction::ClearError => None,
            AppAction::SetLoading(_) => slice,
        }
    }
}
