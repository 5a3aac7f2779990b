//! Page lifecycle notifications.

use serde::{Deserialize, Serialize};

/// How the current document was reached, as reported by navigation timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationType {
    Navigate,
    Reload,
    BackForward,
    Prerender,
}

/// A "page became visible" notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageShow {
    /// True when the page was restored from the back-forward cache.
    pub persisted: bool,

    /// Navigation type of the document, when the host can report it.
    pub navigation: Option<NavigationType>,
}

impl PageShow {
    /// A show after a full reload.
    pub fn reload() -> Self {
        PageShow {
            persisted: false,
            navigation: Some(NavigationType::Reload),
        }
    }

    /// A show after restoring from the back-forward cache.
    pub fn restored() -> Self {
        PageShow {
            persisted: true,
            navigation: Some(NavigationType::BackForward),
        }
    }

    /// The first show of a freshly navigated document.
    pub fn first_load() -> Self {
        PageShow {
            persisted: false,
            navigation: Some(NavigationType::Navigate),
        }
    }
}
