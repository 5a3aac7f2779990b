//! Epoch-tracked reconciliation of the tab-bar.
//!
//! A reconciler watches one page and keeps its tab-bar on the desired tab.
//! Page changes arrive as signals; each meaningful change begins a new epoch,
//! and a short polling loop for that epoch finds and activates the tab. Loops
//! belonging to superseded epochs notice on their next tick and stop.
//!
//! # Architecture
//!
//! ```text
//!   page-show ─┐
//!              │     ┌──────────────┐  begin epoch   ┌────────────────────┐
//!   mutation ──┼───► │   detectors  │ ─────────────► │ clock + coordinator│
//!              │     └──────────────┘                └─────────┬──────────┘
//!              │                                               │ schedule(epoch, now)
//!              │                                               ▼
//!              │                                     ┌────────────────────┐
//!              │                                     │  attempt(epoch)    │ ──► locator / activate
//!              │                                     │  (timer-driven)    │ ──► reschedule on miss
//!              │                                     └────────────────────┘
//! ```
//!
//! Everything in the box runs on one tokio task, so there is no locking.
//!
//! # Module Structure
//!
//! - [`clock`]: the epoch / settled / retry triple
//! - [`detect`]: when a signal begins a new epoch
//! - [`poll`]: poll interval and retry limit
//! - [`message`]: inbox messages
//! - [`reconciler`]: the coordinator, attempt loop and event loop
//! - [`handle`]: spawning and talking to a running reconciler

pub mod clock;
pub mod detect;
mod handle;
mod message;
pub mod poll;
mod reconciler;


pub use clock::EpochClock;
pub use detect::{RouteTracker, classify_page_show};
pub use handle::{ReconcilerError, ReconcilerHandle};
pub use message::PageSignal;
pub use poll::PollConfig;
pub use reconciler::{AttemptOutcome, ReconcileStats, ReconcileStatus, Reconciler};
