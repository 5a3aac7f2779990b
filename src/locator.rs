//! Target Locator: finds the desired tab by its visible label.
//!
//! Nothing is cached between calls. Every lookup re-queries the page, because
//! the tab-bar may have been unmounted and rebuilt since the previous tick.

use tracing::warn;

use crate::page::TabQuery;

/// The result of looking for the desired tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup<T> {
    /// The desired tab is already the selected one.
    Selected,
    /// The desired tab exists but is not selected.
    Found(T),
    /// The desired tab is not in the document (yet).
    Absent,
}

/// Locates the tab whose trimmed label equals a fixed string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLocator {
    label: String,
}

impl TargetLocator {
    /// Creates a locator for `label`. Surrounding whitespace is ignored.
    pub fn new(label: impl Into<String>) -> Self {
        TargetLocator {
            label: label.into().trim().to_string(),
        }
    }

    /// The label this locator matches.
    pub fn label(&self) -> &str {
        &self.label
    }

    fn matches<Q: TabQuery>(&self, page: &Q, tab: &Q::Tab) -> bool {
        page.tab_label(tab)
            .is_some_and(|text| !self.label.is_empty() && text.trim() == self.label)
    }

    /// Returns true if the selected tab is the desired one.
    ///
    /// A failed query counts as "not selected".
    pub fn is_selected<Q: TabQuery>(&self, page: &Q) -> bool {
        match page.selected_tab() {
            Ok(Some(tab)) => self.matches(page, &tab),
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Selected-tab query failed");
                false
            }
        }
    }

    /// Returns the first tab carrying the desired label, selected or not.
    ///
    /// A failed query counts as "absent".
    pub fn find<Q: TabQuery>(&self, page: &Q) -> Option<Q::Tab> {
        match page.tabs() {
            Ok(tabs) => tabs.into_iter().find(|tab| self.matches(page, tab)),
            Err(e) => {
                warn!(error = %e, "Tab enumeration failed");
                None
            }
        }
    }

    /// Checks selection first, then searches for the tab.
    ///
    /// When the desired tab is already selected the tab list is never
    /// enumerated.
    pub fn locate<Q: TabQuery>(&self, page: &Q) -> Lookup<Q::Tab> {
        if self.is_selected(page) {
            return Lookup::Selected;
        }
        match self.find(page) {
            Some(tab) => Lookup::Found(tab),
            None => Lookup::Absent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::SimulatedPage;

    #[test]
    fn selected_target_short_circuits_enumeration() {
        let page = SimulatedPage::new("/home");
        page.render(&["For you", "Following"], Some("Following"));
        let locator = TargetLocator::new("Following");

        assert_eq!(locator.locate(&page), Lookup::Selected);
        assert_eq!(page.selected_queries(), 1);
        assert_eq!(page.tab_enumerations(), 0);
    }

    #[test]
    fn unselected_target_is_found() {
        let page = SimulatedPage::new("/home");
        page.render(&["For you", "Following"], Some("For you"));
        let locator = TargetLocator::new("Following");

        match locator.locate(&page) {
            Lookup::Found(tab) => {
                assert_eq!(page.tab_label(&tab).as_deref(), Some("Following"))
            }
            other => panic!("expected Found, got {other:?}"),
        }
    }

    #[test]
    fn labels_are_trimmed_on_both_sides() {
        let page = SimulatedPage::new("/home");
        page.render(&["  Following \n"], None);
        let locator = TargetLocator::new(" Following");

        assert!(matches!(locator.locate(&page), Lookup::Found(_)));
        assert_eq!(locator.label(), "Following");
    }

    #[test]
    fn match_is_exact_not_substring() {
        let page = SimulatedPage::new("/home");
        page.render(&["Following list", "Not Following"], None);
        let locator = TargetLocator::new("Following");

        assert_eq!(locator.locate(&page), Lookup::Absent);
    }

    #[test]
    fn unlabelled_tabs_never_match() {
        let page = SimulatedPage::new("/home");
        page.push_unlabelled_tab();

        assert_eq!(TargetLocator::new("Following").locate(&page), Lookup::Absent);
        assert_eq!(TargetLocator::new("").locate(&page), Lookup::Absent);
    }

    #[test]
    fn failing_queries_read_as_absent() {
        let page = SimulatedPage::new("/home");
        page.render(&["Following"], None);
        page.set_unavailable(true);

        assert_eq!(TargetLocator::new("Following").locate(&page), Lookup::Absent);
    }

    #[test]
    fn empty_tab_bar_is_absent() {
        let page = SimulatedPage::new("/home");
        assert_eq!(TargetLocator::new("Following").locate(&page), Lookup::Absent);
    }
}
