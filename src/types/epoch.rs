//! Epoch identifiers and the reasons an epoch begins.
//!
//! An epoch names one logical "page state". Any signal interpreted as "the
//! page meaningfully changed" advances it; work tied to an older epoch is
//! superseded and must have no effect.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A generation number identifying one logical page state.
///
/// Epochs are strictly increasing over the lifetime of a reconciler and never
/// reused. `Epoch::ZERO` is the state before any epoch has begun.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Epoch(pub u64);

impl Epoch {
    /// The epoch before anything has happened.
    pub const ZERO: Epoch = Epoch(0);

    /// Returns the epoch that follows this one.
    pub fn next(self) -> Epoch {
        Epoch(self.0 + 1)
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

impl From<u64> for Epoch {
    fn from(n: u64) -> Self {
        Epoch(n)
    }
}

/// Why a new epoch was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EpochReason {
    /// The reconciler started while the page was on the monitored route.
    InitialLoad,
    /// The page was shown after a full reload.
    Reload,
    /// The page was restored from the back-forward cache.
    Restore,
    /// A client-side route change landed on the monitored route.
    PathChange,
    /// The route stayed put but the content was rebuilt while unsettled
    /// (account switch, in-place re-render).
    DomRefresh,
}

impl EpochReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EpochReason::InitialLoad => "initial-load",
            EpochReason::Reload => "reload",
            EpochReason::Restore => "restore",
            EpochReason::PathChange => "path-change",
            EpochReason::DomRefresh => "dom-refresh",
        }
    }
}

impl fmt::Display for EpochReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
