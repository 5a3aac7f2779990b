use std::path::{Path, PathBuf};

use anyhow::Context;
use tab_reconciler::config::ReconcilerConfig;
use tab_reconciler::scenario::{Scenario, run_scenario};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tab_reconciler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let scenario_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: tab-reconciler <scenario.json>")?;

    // A config file, if given, sits between the defaults and the environment.
    let config = match std::env::var_os("TAB_RECONCILER_CONFIG") {
        Some(path) => ReconcilerConfig::load(Path::new(&path))
            .with_context(|| format!("loading config {}", Path::new(&path).display()))?
            .overlay_env()?,
        None => ReconcilerConfig::from_env()?,
    };

    let scenario = Scenario::load(&scenario_path)
        .with_context(|| format!("loading scenario {}", scenario_path.display()))?;

    tracing::info!(
        monitored_path = %config.monitored_path,
        target_label = %config.target_label,
        poll_interval_ms = config.poll.poll_interval.as_millis() as u64,
        retry_limit = config.poll.retry_limit,
        "Starting tab reconciler"
    );

    let report = run_scenario(config, &scenario).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
