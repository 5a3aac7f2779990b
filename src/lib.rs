//! Tab Reconciler - keeps a single-page application's tab-bar on a desired tab.
//!
//! Single-page applications remount their UI at will: initial loads, reloads,
//! back-forward restores, client-side route changes and silent rebuilds such as
//! account switches all discard the tab-bar and render it again, often with a
//! default tab selected. This library watches those signals and, for each new
//! page state, polls until the desired tab is selected, clicking it once if
//! needed.
//!
//! The hard part is staying idempotent while signals arrive out of order and
//! old polling loops are still queued. Every page state gets an [`Epoch`]; work
//! scheduled for an older epoch checks for supersession when it runs and does
//! nothing.
//!
//! [`Epoch`]: types::Epoch

pub mod config;
pub mod locator;
pub mod page;
pub mod reconcile;
pub mod scenario;
pub mod types;

#[cfg(test)]
pub mod test_utils;
