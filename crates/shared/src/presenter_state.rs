use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a presenter. `Cleared` is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PresenterState {
    #[default]
    Unbound,
    Loading,
    Displayed,
    Failed(String),
    Cleared,
}

impl PresenterState {
    pub fn is_loading(&self) -> bool {
        matches!(self, PresenterState::Loading)
    }

    pub fn is_displayed(&self) -> bool {
        matches!(self, PresenterState::Displayed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, PresenterState::Failed(_))
    }

    pub fn is_cleared(&self) -> bool {
        matches!(self, PresenterState::Cleared)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            PresenterState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    /// Loading or already showing the image; a repeated identical model is a no-op here.
    pub fn is_settled_or_pending(&self) -> bool {
        matches!(self, PresenterState::Loading | PresenterState::Displayed)
    }
}

impl fmt::Display for PresenterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresenterState::Unbound => write!(f, "Unbound"),
            PresenterState::Loading => write!(f, "Loading"),
            PresenterState::Displayed => write!(f, "Displayed"),
            PresenterState::Failed(msg) => write!(f, "Failed: {}", msg),
            PresenterState::Cleared => write!(f, "Cleared"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterEvent {
    ModelSet,
    LoadComplete,
    LoadFailed(String),
    Clear,
}

impl PresenterEvent {
    pub fn apply_to_state(self, current_state: PresenterState) -> PresenterState {
        match (self, current_state) {
            (_, PresenterState::Cleared) => PresenterState::Cleared,
            (PresenterEvent::Clear, _) => PresenterState::Cleared,
            (PresenterEvent::ModelSet, _) => PresenterState::Loading,
            (PresenterEvent::LoadComplete, PresenterState::Loading) => PresenterState::Displayed,
            (PresenterEvent::LoadFailed(msg), PresenterState::Loading) => {
                PresenterState::Failed(msg)
            }
            // Completions only count while a load is outstanding
            (_, state) => state,
        }
    }
}
