//! The generation clock.
//!
//! Holds the triple every decision point reads: the current epoch, the last
//! settled epoch, and the retry counter of the current epoch's loop. The clock
//! has exactly one owner (the [`Reconciler`](super::Reconciler)), so the
//! invariants below hold without locking:
//!
//! - `current` strictly increases and is never reused.
//! - `settled <= current` whenever `settled` is set.
//! - `retries` is reset exactly when a new epoch begins and otherwise only grows.

use crate::types::{Epoch, EpochReason};

/// Epoch bookkeeping for one reconciler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpochClock {
    current: Epoch,
    reason: Option<EpochReason>,
    settled: Option<Epoch>,
    retries: u32,
}

impl Default for EpochClock {
    fn default() -> Self {
        Self::new()
    }
}

impl EpochClock {
    /// Creates a clock before any epoch: current is [`Epoch::ZERO`], nothing settled.
    pub fn new() -> Self {
        EpochClock {
            current: Epoch::ZERO,
            reason: None,
            settled: None,
            retries: 0,
        }
    }

    /// The current epoch.
    pub fn current(&self) -> Epoch {
        self.current
    }

    /// Why the current epoch began, if one has.
    pub fn reason(&self) -> Option<EpochReason> {
        self.reason
    }

    /// The last epoch whose desired selection was confirmed.
    pub fn settled(&self) -> Option<Epoch> {
        self.settled
    }

    /// Failed attempts so far in the current epoch.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Advances to a new epoch and resets the retry counter.
    ///
    /// There is no deduplication: every call produces a fresh epoch.
    pub fn advance(&mut self, reason: EpochReason) -> Epoch {
        self.current = self.current.next();
        self.reason = Some(reason);
        self.retries = 0;
        self.current
    }

    /// True if `epoch` has not been superseded.
    pub fn is_current(&self, epoch: Epoch) -> bool {
        epoch == self.current
    }

    /// True if `epoch` has already been reconciled.
    pub fn is_settled(&self, epoch: Epoch) -> bool {
        self.settled == Some(epoch)
    }

    /// True if the current page state is already reconciled.
    pub fn current_is_settled(&self) -> bool {
        self.is_settled(self.current)
    }

    /// Marks `epoch` as reconciled. Ignored unless `epoch` is current.
    pub fn settle(&mut self, epoch: Epoch) {
        if self.is_current(epoch) {
            self.settled = Some(epoch);
        }
    }

    /// Records a failed attempt in the current epoch and returns the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.retries = self.retries.saturating_add(1);
        self.retries
    }
}
