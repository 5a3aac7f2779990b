//! Messages delivered to a running reconciler.
//!
//! The reconciler processes its inbox serially, so every signal observes and
//! mutates the epoch state without interleaving.

use tokio::sync::oneshot;

use crate::page::PageShow;

use super::reconciler::ReconcileStatus;

/// Signals that can be sent to a reconciler task.
#[derive(Debug)]
pub enum PageSignal {
    /// The page became visible (load, reload, back-forward restore).
    PageShow(PageShow),

    /// The document subtree changed.
    ///
    /// Notifications may be batched, delayed or coalesced. The payload is
    /// deliberately empty: the handler re-derives everything from the page.
    Mutation,

    /// Request the current status snapshot.
    Status(oneshot::Sender<ReconcileStatus>),

    /// Stop the event loop. Pending attempts are dropped.
    Shutdown,
}
