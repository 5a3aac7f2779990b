//! Change detectors: decide when a browser signal must begin a new epoch.
//!
//! The subscriptions themselves (page-show listener, mutation observer) belong
//! to the host. What lives here is the decision logic. Structural
//! notifications carry no usable payload, so every decision re-reads the
//! route instead of trusting what the notification says.

use crate::page::{NavigationType, PageShow};
use crate::types::EpochReason;

/// Decides whether a page-show notification begins a new epoch.
///
/// Reloads and back-forward restores always do, whatever the route; the
/// attempt itself filters by route. A plain first show does not, since the
/// initial-load trigger already covers it.
pub fn classify_page_show(show: &PageShow) -> Option<EpochReason> {
    if show.persisted {
        Some(EpochReason::Restore)
    } else if show.navigation == Some(NavigationType::Reload) {
        Some(EpochReason::Reload)
    } else {
        None
    }
}

/// Tracks the last observed route to tell route changes from in-place rebuilds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteTracker {
    monitored_path: String,
    observed_path: String,
}

impl RouteTracker {
    /// Creates a tracker that starts out having observed `initial_path`.
    pub fn new(monitored_path: impl Into<String>, initial_path: impl Into<String>) -> Self {
        RouteTracker {
            monitored_path: monitored_path.into(),
            observed_path: initial_path.into(),
        }
    }

    /// The route recorded by the last structural notification.
    pub fn observed_path(&self) -> &str {
        &self.observed_path
    }

    /// True if `path` is the monitored route.
    pub fn is_monitored(&self, path: &str) -> bool {
        path == self.monitored_path
    }

    /// Handles one structural notification.
    ///
    /// - Route changed: record it; begin an epoch only if it is now the
    ///   monitored route.
    /// - Route unchanged: begin an epoch if on the monitored route and the
    ///   current epoch is not settled.
    pub fn on_mutation(&mut self, current_path: &str, settled: bool) -> Option<EpochReason> {
        if current_path != self.observed_path {
            self.observed_path = current_path.to_string();
            return self
                .is_monitored(current_path)
                .then_some(EpochReason::PathChange);
        }

        (self.is_monitored(current_path) && !settled).then_some(EpochReason::DomRefresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_and_restore_begin_epochs() {
        assert_eq!(
            classify_page_show(&PageShow::reload()),
            Some(EpochReason::Reload)
        );
        assert_eq!(
            classify_page_show(&PageShow::restored()),
            Some(EpochReason::Restore)
        );
    }

    #[test]
    fn persisted_wins_over_navigation_type() {
        let show = PageShow {
            persisted: true,
            navigation: Some(NavigationType::Reload),
        };
        assert_eq!(classify_page_show(&show), Some(EpochReason::Restore));
    }

    #[test]
    fn plain_show_does_not_begin_an_epoch() {
        assert_eq!(classify_page_show(&PageShow::first_load()), None);
        let unknown = PageShow {
            persisted: false,
            navigation: None,
        };
        assert_eq!(classify_page_show(&unknown), None);
    }

    #[test]
    fn route_change_to_monitored_path_begins_epoch() {
        let mut tracker = RouteTracker::new("/home", "/explore");

        assert_eq!(
            tracker.on_mutation("/home", true),
            Some(EpochReason::PathChange)
        );
        assert_eq!(tracker.observed_path(), "/home");
    }

    #[test]
    fn route_change_elsewhere_is_recorded_but_ignored() {
        let mut tracker = RouteTracker::new("/home", "/home");

        assert_eq!(tracker.on_mutation("/explore", false), None);
        assert_eq!(tracker.observed_path(), "/explore");
    }

    #[test]
    fn route_change_ignores_settled_state() {
        // Coming back to the monitored route always starts over, even if the
        // previous epoch was settled.
        let mut tracker = RouteTracker::new("/home", "/notifications");
        assert_eq!(
            tracker.on_mutation("/home", true),
            Some(EpochReason::PathChange)
        );
    }

    #[test]
    fn rebuild_on_monitored_route_while_unsettled_begins_epoch() {
        let mut tracker = RouteTracker::new("/home", "/home");

        assert_eq!(
            tracker.on_mutation("/home", false),
            Some(EpochReason::DomRefresh)
        );
    }

    #[test]
    fn rebuild_while_settled_is_ignored() {
        let mut tracker = RouteTracker::new("/home", "/home");
        assert_eq!(tracker.on_mutation("/home", true), None);
    }

    #[test]
    fn rebuild_off_route_is_ignored() {
        let mut tracker = RouteTracker::new("/home", "/explore");
        assert_eq!(tracker.on_mutation("/explore", false), None);
    }
}
