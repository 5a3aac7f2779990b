//! Scenario replay against a simulated page.
//!
//! A scenario is a JSON script of page events: route changes, tab-bar renders,
//! user clicks, reloads and pauses. Each step mutates a [`SimulatedPage`] and
//! delivers the notification a browser would deliver, to a reconciler running
//! as its own task. The reconciler's clicks echo a structural notification
//! back into its inbox, as a re-rendering page would.
//!
//! ```json
//! {
//!   "initial_path": "/home",
//!   "steps": [
//!     { "step": "render", "tabs": ["For you", "Following"], "selected": "For you" },
//!     { "step": "wait", "ms": 1000 }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::{DEFAULT_MONITORED_PATH, ReconcilerConfig};
use crate::page::{PageShow, SimulatedPage};
use crate::reconcile::{ReconcileStatus, Reconciler, ReconcilerError, ReconcilerHandle};

/// Errors that can occur while loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// IO error reading a scenario file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario file is not valid JSON for this schema.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The reconciler task stopped during replay.
    #[error("reconciler error: {0}")]
    Reconciler(#[from] ReconcilerError),

    /// A `click` step named a tab that is not rendered.
    #[error("no tab labelled {0:?} to click")]
    UnknownTab(String),
}

/// Result type for scenario operations.
pub type Result<T> = std::result::Result<T, ScenarioError>;

fn default_initial_path() -> String {
    DEFAULT_MONITORED_PATH.to_string()
}

/// A scripted sequence of page events.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scenario {
    /// Route of the page when the reconciler starts.
    #[serde(default = "default_initial_path")]
    pub initial_path: String,

    /// Steps, applied in order.
    pub steps: Vec<ScenarioStep>,
}

/// One scripted page event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ScenarioStep {
    /// Client-side route change.
    Navigate { path: String },
    /// Mount a fresh tab-bar.
    Render {
        tabs: Vec<String>,
        #[serde(default)]
        selected: Option<String>,
    },
    /// Unmount the tab-bar.
    Clear,
    /// A structural notification with no visible change.
    Mutate,
    /// Full reload of the page.
    Reload,
    /// Restore from the back-forward cache.
    Restore,
    /// The user clicks a tab.
    Click { label: String },
    /// Let time pass.
    Wait { ms: u64 },
}

/// The state of the page and reconciler after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub status: ReconcileStatus,
    /// Activations performed by the reconciler.
    pub activations: usize,
    /// Label of the tab selected at the end.
    pub selected_label: Option<String>,
}

impl Scenario {
    /// Loads a scenario from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parses a scenario from a JSON document.
    pub fn from_json(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }
}

/// Replays `scenario` against a fresh simulated page and reports the outcome.
pub async fn run_scenario(config: ReconcilerConfig, scenario: &Scenario) -> Result<ScenarioReport> {
    info!(
        initial_path = %scenario.initial_path,
        steps = scenario.steps.len(),
        "Replaying scenario"
    );

    let (tx, rx) = ReconcilerHandle::channel();
    let page = SimulatedPage::new(scenario.initial_path.as_str()).with_activation_feedback(tx.clone());
    let handle = ReconcilerHandle::spawn_with_channel(
        Reconciler::new(config, page.clone()),
        tx,
        rx,
        CancellationToken::new(),
    );

    let replayed = apply_steps(&handle, &page, &scenario.steps).await;
    let status = match replayed {
        Ok(()) => handle.status().await.map_err(ScenarioError::from),
        Err(e) => Err(e),
    };
    handle.shutdown().await?;

    Ok(ScenarioReport {
        status: status?,
        activations: page.activations(),
        selected_label: page.selected_label(),
    })
}

async fn apply_steps(
    handle: &ReconcilerHandle,
    page: &SimulatedPage,
    steps: &[ScenarioStep],
) -> Result<()> {
    for (index, step) in steps.iter().enumerate() {
        debug!(index, ?step, "Applying scenario step");
        match step {
            ScenarioStep::Navigate { path } => {
                page.set_path(path.as_str());
                handle.notify_mutation().await?;
            }
            ScenarioStep::Render { tabs, selected } => {
                let labels: Vec<&str> = tabs.iter().map(String::as_str).collect();
                page.render(&labels, selected.as_deref());
                handle.notify_mutation().await?;
            }
            ScenarioStep::Clear => {
                page.clear();
                handle.notify_mutation().await?;
            }
            ScenarioStep::Mutate => {
                handle.notify_mutation().await?;
            }
            ScenarioStep::Reload => {
                handle.page_show(PageShow::reload()).await?;
            }
            ScenarioStep::Restore => {
                handle.page_show(PageShow::restored()).await?;
            }
            ScenarioStep::Click { label } => {
                if !page.select(label) {
                    return Err(ScenarioError::UnknownTab(label.clone()));
                }
                handle.notify_mutation().await?;
            }
            ScenarioStep::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(*ms)).await;
            }
        }
    }
    Ok(())
}
