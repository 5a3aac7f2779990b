//! The page boundary: capabilities the reconciler consumes from a live document.
//!
//! The reconciler never owns DOM nodes across ticks. Each attempt asks the page
//! afresh for the selected tab and the list of tabs, because a remount-prone
//! tree may have replaced every node since the last look.
//!
//! The traits here play the same role as interpreter traits in an
//! effects-as-data design: the core decides, the page executes. Tests and the
//! scenario runner use [`SimulatedPage`]; a browser binding implements the
//! same traits over a real document.

use thiserror::Error;

pub mod lifecycle;
pub mod sim;

pub use lifecycle::{NavigationType, PageShow};
pub use sim::SimulatedPage;

/// Errors a page capability may report.
///
/// None of these escape an attempt. Query failures are treated as "target
/// absent", activation failures leave the epoch unsettled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageError {
    /// The document is in a state where it cannot be queried.
    #[error("document unavailable: {0}")]
    Unavailable(String),

    /// The element was removed from the document before it could be used.
    #[error("element detached from document")]
    Detached,
}

/// Result type for page capabilities.
pub type Result<T> = std::result::Result<T, PageError>;

/// Reads the current logical route of the document.
pub trait RouteSource {
    /// Returns the current path, e.g. `/home`.
    fn pathname(&self) -> Result<String>;
}

/// Queries tab-like elements in the document.
pub trait TabQuery {
    /// A reference to one tab element. Only valid for the tick it was fetched in.
    type Tab;

    /// Returns the currently selected tab, if any.
    fn selected_tab(&self) -> Result<Option<Self::Tab>>;

    /// Enumerates all tab elements in document order.
    fn tabs(&self) -> Result<Vec<Self::Tab>>;

    /// Returns the visible text label of a tab, if it has one.
    ///
    /// The returned text is not trimmed; callers trim before comparing.
    fn tab_label(&self, tab: &Self::Tab) -> Option<String>;
}

/// Triggers the primary activation (a click) of a tab element.
pub trait TabActivator: TabQuery {
    /// Activates `tab`. The page may mutate asynchronously as a result.
    fn activate(&mut self, tab: &Self::Tab) -> Result<()>;
}

/// Everything the reconciler needs from a document.
pub trait Page: RouteSource + TabQuery + TabActivator {}

impl<T> Page for T where T: RouteSource + TabQuery + TabActivator {}
