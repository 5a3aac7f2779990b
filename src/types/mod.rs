//! Core domain types for the tab reconciler.

pub mod epoch;

pub use epoch::{Epoch, EpochReason};
