//! Shared test utilities and arbitrary generators for property-based testing.

use std::time::Duration;

use proptest::prelude::*;
use tokio::time::Instant;

use crate::config::ReconcilerConfig;
use crate::page::{Page, PageShow, SimulatedPage};
use crate::reconcile::{AttemptOutcome, PollConfig, Reconciler};
use crate::types::Epoch;

pub const HOME: &str = "/home";
pub const TARGET: &str = "Following";
pub const OTHER: &str = "For you";

/// Default configuration: `/home`, `Following`, 300 ms, 25 attempts.
pub fn test_config() -> ReconcilerConfig {
    ReconcilerConfig::default()
}

/// Configuration with a small retry limit for exhaustive scenarios.
pub fn short_config(retry_limit: u32) -> ReconcilerConfig {
    ReconcilerConfig::default().with_poll(
        PollConfig::new()
            .with_poll_interval(Duration::from_millis(300))
            .with_retry_limit(retry_limit),
    )
}

/// An empty page on the monitored route.
pub fn home_page() -> SimulatedPage {
    SimulatedPage::new(HOME)
}

/// Fires attempts in due order until nothing is due at or before `target`,
/// the way the event loop would if left alone until then.
pub fn run_until<P: Page>(
    reconciler: &mut Reconciler<P>,
    target: Instant,
) -> Vec<(Epoch, AttemptOutcome)> {
    let mut outcomes = Vec::new();
    while let Some(due) = reconciler.next_due()
        && due <= target
    {
        outcomes.extend(reconciler.fire_due_attempts(due));
    }
    outcomes
}

/// One thing that can happen to a page.
#[derive(Debug, Clone)]
pub enum PageOp {
    /// Structural notification with no other change.
    Mutation,
    /// Full reload notification.
    Reload,
    /// Back-forward restore notification.
    Restore,
    /// Client-side navigation, followed by a structural notification.
    Navigate { home: bool },
    /// Tab-bar mounted with the target present, followed by a notification.
    Render { target_selected: bool },
    /// Tab-bar mounted without the target, followed by a notification.
    RenderWithoutTarget,
    /// Tab-bar unmounted, followed by a notification.
    Clear,
    /// User selects the other tab; the page re-renders its selection.
    UserSelectsOther,
    /// Time passes.
    Advance { ms: u64 },
}

pub fn arb_page_op() -> impl Strategy<Value = PageOp> {
    prop_oneof![
        3 => Just(PageOp::Mutation),
        1 => Just(PageOp::Reload),
        1 => Just(PageOp::Restore),
        2 => any::<bool>().prop_map(|home| PageOp::Navigate { home }),
        2 => any::<bool>().prop_map(|target_selected| PageOp::Render { target_selected }),
        1 => Just(PageOp::RenderWithoutTarget),
        1 => Just(PageOp::Clear),
        1 => Just(PageOp::UserSelectsOther),
        4 => (0u64..2_000).prop_map(|ms| PageOp::Advance { ms }),
    ]
}

pub fn arb_page_ops() -> impl Strategy<Value = Vec<PageOp>> {
    prop::collection::vec(arb_page_op(), 0..60)
}

/// Applies `op` to `page` and delivers the matching signal to `reconciler`.
///
/// Returns the new current time.
pub fn apply_op(
    reconciler: &mut Reconciler<SimulatedPage>,
    page: &SimulatedPage,
    op: &PageOp,
    now: Instant,
) -> Instant {
    match op {
        PageOp::Mutation => {
            reconciler.handle_mutation(now);
        }
        PageOp::Reload => {
            reconciler.handle_page_show(&PageShow::reload(), now);
        }
        PageOp::Restore => {
            reconciler.handle_page_show(&PageShow::restored(), now);
        }
        PageOp::Navigate { home } => {
            page.set_path(if *home { HOME } else { "/explore" });
            reconciler.handle_mutation(now);
        }
        PageOp::Render { target_selected } => {
            let selected = if *target_selected { TARGET } else { OTHER };
            page.render(&[OTHER, TARGET], Some(selected));
            reconciler.handle_mutation(now);
        }
        PageOp::RenderWithoutTarget => {
            page.render(&[OTHER], Some(OTHER));
            reconciler.handle_mutation(now);
        }
        PageOp::Clear => {
            page.clear();
            reconciler.handle_mutation(now);
        }
        PageOp::UserSelectsOther => {
            page.select(OTHER);
            reconciler.handle_mutation(now);
        }
        PageOp::Advance { ms } => {
            return now + Duration::from_millis(*ms);
        }
    }
    now
}
