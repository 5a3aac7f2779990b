//! An in-memory document with a tab-bar.
//!
//! `SimulatedPage` is cheaply cloneable; clones share the same document, so a
//! test or scenario can keep one clone to mutate the page while the reconciler
//! owns another. Every render bumps a render counter and invalidates tab
//! references fetched before it, which is how remounts look from the outside.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use crate::reconcile::PageSignal;

use super::{PageError, Result, RouteSource, TabActivator, TabQuery};

/// A reference to a tab in a specific render of the simulated document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimTab {
    index: usize,
    render: u64,
}

#[derive(Debug, Clone)]
struct TabNode {
    label: Option<String>,
    selected: bool,
}

#[derive(Debug, Default)]
struct SimState {
    path: String,
    tabs: Vec<TabNode>,
    render: u64,
    unavailable: bool,
    fail_activation: bool,
    selected_queries: usize,
    tab_enumerations: usize,
    activations: usize,
    feedback: Option<mpsc::Sender<PageSignal>>,
}

/// A shared, in-memory page.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPage {
    inner: Arc<Mutex<SimState>>,
}

impl SimulatedPage {
    /// Creates an empty page at `path` with no tabs rendered.
    pub fn new(path: impl Into<String>) -> Self {
        let page = SimulatedPage::default();
        page.state().path = path.into();
        page
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Feeds a structural notification into `tx` whenever a tab is activated.
    ///
    /// Real pages re-render after a click; this reproduces that echo.
    pub fn with_activation_feedback(self, tx: mpsc::Sender<PageSignal>) -> Self {
        self.state().feedback = Some(tx);
        self
    }

    /// Changes the route without touching the tab-bar.
    pub fn set_path(&self, path: impl Into<String>) {
        self.state().path = path.into();
    }

    /// Replaces the tab-bar with freshly mounted tabs.
    ///
    /// `selected` names the label to mark selected, if any.
    pub fn render(&self, labels: &[&str], selected: Option<&str>) {
        let tabs = labels
            .iter()
            .map(|label| TabNode {
                label: Some((*label).to_string()),
                selected: selected.is_some_and(|s| s.trim() == label.trim()),
            })
            .collect();
        let mut state = self.state();
        state.tabs = tabs;
        state.render += 1;
    }

    /// Appends a tab element that has no text content.
    pub fn push_unlabelled_tab(&self) {
        let mut state = self.state();
        state.tabs.push(TabNode {
            label: None,
            selected: false,
        });
        state.render += 1;
    }

    /// Unmounts the whole tab-bar.
    pub fn clear(&self) {
        let mut state = self.state();
        state.tabs.clear();
        state.render += 1;
    }

    /// Selects the tab with `label` the way a user click would.
    ///
    /// Does not count as an activation. Returns false if no such tab exists.
    pub fn select(&self, label: &str) -> bool {
        let mut state = self.state();
        let Some(index) = state
            .tabs
            .iter()
            .position(|t| t.label.as_deref().is_some_and(|l| l.trim() == label))
        else {
            return false;
        };
        for (i, tab) in state.tabs.iter_mut().enumerate() {
            tab.selected = i == index;
        }
        true
    }

    /// Makes every query fail with [`PageError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Makes every activation fail with [`PageError::Detached`].
    pub fn set_fail_activation(&self, fail: bool) {
        self.state().fail_activation = fail;
    }

    /// Returns the trimmed label of the selected tab.
    pub fn selected_label(&self) -> Option<String> {
        self.state()
            .tabs
            .iter()
            .find(|t| t.selected)
            .and_then(|t| t.label.as_deref())
            .map(|l| l.trim().to_string())
    }

    /// Number of times the selected tab was queried.
    pub fn selected_queries(&self) -> usize {
        self.state().selected_queries
    }

    /// Number of times the tab list was enumerated.
    pub fn tab_enumerations(&self) -> usize {
        self.state().tab_enumerations
    }

    /// Total number of page queries of either kind.
    pub fn queries(&self) -> usize {
        let state = self.state();
        state.selected_queries + state.tab_enumerations
    }

    /// Number of successful activations.
    pub fn activations(&self) -> usize {
        self.state().activations
    }

    fn check_available(state: &SimState) -> Result<()> {
        if state.unavailable {
            Err(PageError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl RouteSource for SimulatedPage {
    fn pathname(&self) -> Result<String> {
        Ok(self.state().path.clone())
    }
}

impl TabQuery for SimulatedPage {
    type Tab = SimTab;

    fn selected_tab(&self) -> Result<Option<SimTab>> {
        let mut state = self.state();
        state.selected_queries += 1;
        Self::check_available(&state)?;
        let render = state.render;
        Ok(state
            .tabs
            .iter()
            .position(|t| t.selected)
            .map(|index| SimTab { index, render }))
    }

    fn tabs(&self) -> Result<Vec<SimTab>> {
        let mut state = self.state();
        state.tab_enumerations += 1;
        Self::check_available(&state)?;
        let render = state.render;
        Ok((0..state.tabs.len())
            .map(|index| SimTab { index, render })
            .collect())
    }

    fn tab_label(&self, tab: &SimTab) -> Option<String> {
        let state = self.state();
        if tab.render != state.render {
            return None;
        }
        state.tabs.get(tab.index).and_then(|t| t.label.clone())
    }
}

impl TabActivator for SimulatedPage {
    fn activate(&mut self, tab: &SimTab) -> Result<()> {
        let mut state = self.state();
        if state.fail_activation || tab.render != state.render || tab.index >= state.tabs.len() {
            return Err(PageError::Detached);
        }
        for (i, node) in state.tabs.iter_mut().enumerate() {
            node.selected = i == tab.index;
        }
        state.activations += 1;
        if let Some(tx) = &state.feedback {
            // A full inbox already holds a pending re-check.
            let _ = tx.try_send(PageSignal::Mutation);
        }
        Ok(())
    }
}
