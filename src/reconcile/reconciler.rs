//! The epoch coordinator and reconciliation loop.
//!
//! A [`Reconciler`] owns the epoch state for one page and drives it from two
//! sources: signals from the page (lifecycle and structural notifications) and
//! its own pending attempt timers. It runs as a single tokio task, so the
//! epoch triple is only ever touched from one place.
//!
//! # Attempt Algorithm
//!
//! Each attempt carries the epoch it was scheduled for and re-validates it on
//! entry. In order, each step short-circuiting the rest:
//!
//! 1. Epoch superseded: return silently.
//! 2. Not on the monitored route: return.
//! 3. Epoch already settled: return.
//! 4. Desired tab already selected: settle.
//! 5. Desired tab present: activate it and settle. The click is not verified.
//! 6. Otherwise count a failure and, below the retry limit, schedule another
//!    attempt for the same epoch after the poll interval.
//!
//! # Cancellation
//!
//! Pending attempts are never cancelled. When a newer epoch begins, the old
//! attempts still fire, fail step 1 and disappear without rescheduling.

use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::config::ReconcilerConfig;
use crate::locator::{Lookup, TargetLocator};
use crate::page::{Page, PageShow};
use crate::types::{Epoch, EpochReason};

use super::clock::EpochClock;
use super::detect::{RouteTracker, classify_page_show};
use super::message::PageSignal;

/// What a single attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum AttemptOutcome {
    /// A newer epoch exists; nothing was queried or changed.
    Stale,
    /// The page is not on the monitored route.
    OffRoute,
    /// This epoch was already settled by an earlier attempt.
    AlreadySettled,
    /// The desired tab was already selected; the epoch is now settled.
    AlreadySelected,
    /// The desired tab was activated; the epoch is now settled.
    Activated,
    /// The desired tab was not found; another attempt is scheduled.
    Retrying { failures: u32 },
    /// The desired tab was not found and the retry limit is reached.
    Exhausted { failures: u32 },
}

impl AttemptOutcome {
    /// True if this attempt settled its epoch.
    pub fn settles(&self) -> bool {
        matches!(self, AttemptOutcome::AlreadySelected | AttemptOutcome::Activated)
    }
}

/// Cumulative counters over the reconciler's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileStats {
    /// Epochs begun, for any reason.
    pub epochs_begun: u64,
    /// Attempts that got as far as querying the page.
    pub attempts: u64,
    /// Successful activations of the desired tab.
    pub activations: u64,
    /// Epochs that gave up after reaching the retry limit.
    pub exhausted: u64,
}

/// A point-in-time view of the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileStatus {
    pub current_epoch: Epoch,
    pub reason: Option<EpochReason>,
    pub settled_epoch: Option<Epoch>,
    pub retries: u32,
    pub pending_attempts: usize,
    /// The most recent outcome other than [`AttemptOutcome::Stale`].
    pub last_outcome: Option<AttemptOutcome>,
    pub stats: ReconcileStats,
}

impl ReconcileStatus {
    /// True if the current epoch has been reconciled.
    pub fn is_settled(&self) -> bool {
        self.settled_epoch == Some(self.current_epoch)
    }
}

/// An attempt waiting for its timer.
#[derive(Debug, Clone, Copy)]
struct PendingAttempt {
    fires_at: Instant,
    epoch: Epoch,
}

/// Keeps one page's tab-bar on the desired tab.
pub struct Reconciler<P> {
    config: ReconcilerConfig,
    page: P,
    locator: TargetLocator,
    clock: EpochClock,
    routes: RouteTracker,
    pending: Vec<PendingAttempt>,
    stats: ReconcileStats,
    last_outcome: Option<AttemptOutcome>,
    status_tx: watch::Sender<ReconcileStatus>,
}

impl<P: Page> Reconciler<P> {
    /// Creates a reconciler for `page`.
    ///
    /// The route tracker starts out having observed the page's current path.
    /// No epoch begins until [`start`](Self::start) or a signal.
    pub fn new(config: ReconcilerConfig, page: P) -> Self {
        let initial_path = page.pathname().unwrap_or_else(|e| {
            warn!(error = %e, "Could not read initial route");
            String::new()
        });
        let locator = TargetLocator::new(config.target_label.as_str());
        let routes = RouteTracker::new(config.monitored_path.as_str(), initial_path);
        let clock = EpochClock::new();
        let (status_tx, _) = watch::channel(ReconcileStatus {
            current_epoch: clock.current(),
            reason: None,
            settled_epoch: None,
            retries: 0,
            pending_attempts: 0,
            last_outcome: None,
            stats: ReconcileStats::default(),
        });

        Reconciler {
            config,
            page,
            locator,
            clock,
            routes,
            pending: Vec::new(),
            stats: ReconcileStats::default(),
            last_outcome: None,
            status_tx,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    /// Returns the page.
    pub fn page(&self) -> &P {
        &self.page
    }

    /// Returns the epoch clock.
    pub fn clock(&self) -> &EpochClock {
        &self.clock
    }

    /// Returns the number of attempts waiting for their timer, stale ones included.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Builds a status snapshot.
    pub fn status(&self) -> ReconcileStatus {
        ReconcileStatus {
            current_epoch: self.clock.current(),
            reason: self.clock.reason(),
            settled_epoch: self.clock.settled(),
            retries: self.clock.retries(),
            pending_attempts: self.pending.len(),
            last_outcome: self.last_outcome,
            stats: self.stats,
        }
    }

    /// Subscribes to status snapshots, published after every signal and every
    /// batch of fired attempts.
    pub fn subscribe(&self) -> watch::Receiver<ReconcileStatus> {
        self.status_tx.subscribe()
    }

    fn publish(&self) {
        self.status_tx.send_replace(self.status());
    }

    fn on_monitored_route(&self) -> bool {
        match self.page.pathname() {
            Ok(path) => self.routes.is_monitored(&path),
            Err(e) => {
                warn!(error = %e, "Route query failed");
                false
            }
        }
    }

    // ─── Epoch Coordinator ────────────────────────────────────────────────────────

    /// Begins the initial-load epoch if the page is on the monitored route.
    pub fn start(&mut self, now: Instant) -> Option<Epoch> {
        let epoch = self
            .on_monitored_route()
            .then(|| self.begin_new_epoch(EpochReason::InitialLoad, now));
        self.publish();
        epoch
    }

    /// Begins a new epoch and schedules its first attempt.
    ///
    /// The attempt is due at `now` but never runs inside this call; it fires
    /// on a later turn of the event loop, after the triggering change has
    /// settled. Calls are not deduplicated: each one supersedes the last.
    pub fn begin_new_epoch(&mut self, reason: EpochReason, now: Instant) -> Epoch {
        let epoch = self.clock.advance(reason);
        self.stats.epochs_begun += 1;
        debug!(epoch = %epoch, reason = %reason, "Beginning new epoch");
        self.schedule(epoch, now);
        epoch
    }

    fn schedule(&mut self, epoch: Epoch, fires_at: Instant) {
        self.pending.push(PendingAttempt { fires_at, epoch });
    }

    // ─── Reconciliation Loop ──────────────────────────────────────────────────────

    /// Runs one attempt for `epoch`.
    ///
    /// Never fails: a missing tab is retried, a failing page is treated as a
    /// missing tab, and a stale epoch is silently ignored.
    pub fn attempt(&mut self, epoch: Epoch, now: Instant) -> AttemptOutcome {
        if !self.clock.is_current(epoch) {
            return AttemptOutcome::Stale;
        }

        let outcome = self.attempt_current(epoch, now);
        self.last_outcome = Some(outcome);
        outcome
    }

    fn attempt_current(&mut self, epoch: Epoch, now: Instant) -> AttemptOutcome {
        if !self.on_monitored_route() {
            return AttemptOutcome::OffRoute;
        }
        if self.clock.is_settled(epoch) {
            return AttemptOutcome::AlreadySettled;
        }

        self.stats.attempts += 1;
        match self.locator.locate(&self.page) {
            Lookup::Selected => {
                self.clock.settle(epoch);
                debug!(epoch = %epoch, "Desired tab already selected");
                AttemptOutcome::AlreadySelected
            }
            Lookup::Found(tab) => match self.page.activate(&tab) {
                Ok(()) => {
                    self.clock.settle(epoch);
                    self.stats.activations += 1;
                    debug!(epoch = %epoch, label = %self.locator.label(), "Activated desired tab");
                    AttemptOutcome::Activated
                }
                Err(e) => {
                    warn!(epoch = %epoch, error = %e, "Activation failed");
                    self.retry_or_give_up(epoch, now)
                }
            },
            Lookup::Absent => self.retry_or_give_up(epoch, now),
        }
    }

    fn retry_or_give_up(&mut self, epoch: Epoch, now: Instant) -> AttemptOutcome {
        let failures = self.clock.record_failure();
        if failures < self.config.poll.retry_limit {
            trace!(epoch = %epoch, failures, "Desired tab not rendered yet, retrying");
            self.schedule(epoch, now + self.config.poll.poll_interval);
            AttemptOutcome::Retrying { failures }
        } else {
            self.stats.exhausted += 1;
            debug!(epoch = %epoch, failures, "Giving up on epoch");
            AttemptOutcome::Exhausted { failures }
        }
    }

    // ─── Timer Management ─────────────────────────────────────────────────────────

    /// Fires every attempt due at or before `now`, in the order they fall due.
    ///
    /// Attempts scheduled while firing are left for a later call.
    pub fn fire_due_attempts(&mut self, now: Instant) -> Vec<(Epoch, AttemptOutcome)> {
        let outcomes = self
            .take_due(now)
            .into_iter()
            .map(|epoch| (epoch, self.attempt(epoch, now)))
            .collect();
        self.publish();
        outcomes
    }

    /// Removes the attempts due at or before `now` without running them.
    ///
    /// Returns their epochs in the order they fall due.
    pub(crate) fn take_due(&mut self, now: Instant) -> Vec<Epoch> {
        let mut due = Vec::new();
        self.pending.retain(|p| {
            if p.fires_at <= now {
                due.push(*p);
                false
            } else {
                true
            }
        });
        // Stable, so attempts due at the same instant keep scheduling order.
        due.sort_by_key(|p| p.fires_at);
        due.into_iter().map(|p| p.epoch).collect()
    }

    /// Returns the earliest instant an attempt falls due.
    pub fn next_due(&self) -> Option<Instant> {
        self.pending.iter().map(|p| p.fires_at).min()
    }

    fn time_until_next_attempt(&self, now: Instant) -> Option<Duration> {
        self.next_due()
            .map(|fires_at| fires_at.saturating_duration_since(now))
    }

    // ─── Change Detectors ─────────────────────────────────────────────────────────

    /// Handles a page-show notification.
    pub fn handle_page_show(&mut self, show: &PageShow, now: Instant) -> Option<Epoch> {
        let reason = classify_page_show(show)?;
        Some(self.begin_new_epoch(reason, now))
    }

    /// Handles a structural notification.
    pub fn handle_mutation(&mut self, now: Instant) -> Option<Epoch> {
        let path = match self.page.pathname() {
            Ok(path) => path,
            Err(e) => {
                warn!(error = %e, "Route query failed during mutation");
                return None;
            }
        };
        let settled = self.clock.current_is_settled();
        let reason = self.routes.on_mutation(&path, settled)?;
        Some(self.begin_new_epoch(reason, now))
    }

    /// Handles one inbox message. `Shutdown` is handled by [`run`](Self::run).
    pub fn handle_signal(&mut self, signal: PageSignal, now: Instant) {
        match signal {
            PageSignal::PageShow(show) => {
                trace!(?show, "Page shown");
                self.handle_page_show(&show, now);
            }
            PageSignal::Mutation => {
                self.handle_mutation(now);
            }
            PageSignal::Status(reply) => {
                // The requester may have given up waiting.
                let _ = reply.send(self.status());
            }
            PageSignal::Shutdown => {}
        }
        self.publish();
    }

    // ─── Async Event Loop ─────────────────────────────────────────────────────────

    /// Runs the reconciler until shutdown.
    ///
    /// Begins the initial-load epoch, then serves inbox messages and attempt
    /// timers on one task until the token is cancelled, a `Shutdown` message
    /// arrives or every sender is dropped.
    #[instrument(skip_all, fields(path = %self.config.monitored_path, label = %self.locator.label()))]
    pub async fn run(mut self, mut rx: mpsc::Receiver<PageSignal>, shutdown: CancellationToken) {
        info!("Reconciler event loop started");
        self.start(Instant::now());

        loop {
            let next_wakeup = self.time_until_next_attempt(Instant::now());

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping reconciler");
                    break;
                }

                msg = rx.recv() => {
                    match msg {
                        Some(PageSignal::Shutdown) => {
                            info!("Shutdown message received");
                            break;
                        }
                        Some(signal) => self.handle_signal(signal, Instant::now()),
                        None => {
                            info!("Signal channel closed");
                            break;
                        }
                    }
                }

                _ = async {
                    match next_wakeup {
                        Some(delay) => tokio::time::sleep(delay).await,
                        None => std::future::pending().await,
                    }
                } => {
                    self.fire_due_attempts(Instant::now());
                }
            }
        }

        info!(
            epoch = %self.clock.current(),
            dropped = self.pending.len(),
            "Reconciler event loop stopped"
        );
    }
}
