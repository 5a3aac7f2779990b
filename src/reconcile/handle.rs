//! Spawning a reconciler and talking to it.
//!
//! The reconciler runs as its own tokio task and owns all epoch state. Hosts
//! hold a [`ReconcilerHandle`] and forward browser notifications through it;
//! the handle never touches the state directly.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::page::{Page, PageShow};

use super::message::PageSignal;
use super::reconciler::{ReconcileStatus, Reconciler};

/// Errors that can occur while talking to a reconciler task.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// The reconciler task has stopped and no longer accepts signals.
    #[error("failed to send signal to reconciler: channel closed")]
    ChannelClosed,

    /// The reconciler stopped before answering a status request.
    #[error("reconciler stopped before reporting status")]
    StatusUnavailable,

    /// The reconciler task panicked or was aborted.
    #[error("reconciler task failed: {0}")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Result type for handle operations.
pub type Result<T> = std::result::Result<T, ReconcilerError>;

/// Channel buffer size for page signals.
///
/// Structural notifications carry no payload, so a burst that fills the buffer
/// loses nothing a later notification would not re-check.
const SIGNAL_CHANNEL_BUFFER: usize = 64;

/// A handle to a running reconciler task.
pub struct ReconcilerHandle {
    tx: mpsc::Sender<PageSignal>,
    status: watch::Receiver<ReconcileStatus>,
    task: JoinHandle<()>,
    cancel: CancellationToken,
}

impl ReconcilerHandle {
    /// Spawns `reconciler` on the current tokio runtime.
    pub fn spawn<P>(reconciler: Reconciler<P>) -> Self
    where
        P: Page + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SIGNAL_CHANNEL_BUFFER);
        Self::spawn_with_channel(reconciler, tx, rx, CancellationToken::new())
    }

    /// Spawns `reconciler` reading from an existing channel.
    ///
    /// Useful when the page needs a sender before the reconciler exists, e.g.
    /// to echo structural notifications after an activation.
    pub fn spawn_with_channel<P>(
        reconciler: Reconciler<P>,
        tx: mpsc::Sender<PageSignal>,
        rx: mpsc::Receiver<PageSignal>,
        cancel: CancellationToken,
    ) -> Self
    where
        P: Page + Send + 'static,
    {
        let status = reconciler.subscribe();
        debug!("Spawning reconciler task");
        let task = tokio::spawn(reconciler.run(rx, cancel.clone()));
        ReconcilerHandle {
            tx,
            status,
            task,
            cancel,
        }
    }

    /// Creates a signal channel sized for a reconciler inbox.
    pub fn channel() -> (mpsc::Sender<PageSignal>, mpsc::Receiver<PageSignal>) {
        mpsc::channel(SIGNAL_CHANNEL_BUFFER)
    }

    /// Returns a sender for raw signals.
    pub fn sender(&self) -> mpsc::Sender<PageSignal> {
        self.tx.clone()
    }

    /// Forwards a page-show notification.
    pub async fn page_show(&self, show: PageShow) -> Result<()> {
        self.send(PageSignal::PageShow(show)).await
    }

    /// Forwards a structural notification.
    pub async fn notify_mutation(&self) -> Result<()> {
        self.send(PageSignal::Mutation).await
    }

    async fn send(&self, signal: PageSignal) -> Result<()> {
        self.tx
            .send(signal)
            .await
            .map_err(|_| ReconcilerError::ChannelClosed)
    }

    /// Asks the reconciler for a status snapshot.
    ///
    /// The answer reflects every signal sent through this handle before the call.
    pub async fn status(&self) -> Result<ReconcileStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(PageSignal::Status(reply)).await?;
        rx.await.map_err(|_| ReconcilerError::StatusUnavailable)
    }

    /// Subscribes to status snapshots published by the reconciler.
    pub fn subscribe(&self) -> watch::Receiver<ReconcileStatus> {
        self.status.clone()
    }

    /// Stops the reconciler and waits for its task to finish.
    pub async fn shutdown(self) -> Result<()> {
        // The task may already have exited; the token stops it either way.
        let _ = self.tx.send(PageSignal::Shutdown).await;
        self.cancel.cancel();
        self.task.await?;
        Ok(())
    }
}
