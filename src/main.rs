//! merge-pilot binary: runs one coordinator tick and exits.
//!
//! Orchestration is deliberately external: run this from cron or a systemd
//! timer for polling, or from a webhook-triggered job for event-driven
//! operation. At most one invocation per repository should run at a time.

use std::time::Duration;

use merge_pilot::engine;
use merge_pilot::github::OctocrabHost;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Invocation parameters, in positional order.
#[derive(Debug)]
struct Config {
    owner: String,
    repo: String,
    base_branch: String,
    token: String,
    lookback: Duration,
}

impl Config {
    /// Parses `<owner> <repo> <base-branch> <token> <lookback>`.
    fn from_args(mut args: impl Iterator<Item = String>) -> anyhow::Result<Config> {
        let mut next =
            |name: &str| args.next().ok_or_else(|| anyhow::anyhow!("missing argument: {name}"));
        let owner = next("owner")?;
        let repo = next("repo")?;
        let base_branch = next("base-branch")?;
        let token = next("token")?;
        let lookback = parse_lookback(&next("lookback")?)?;
        Ok(Config {
            owner,
            repo,
            base_branch,
            token,
            lookback,
        })
    }
}

/// Parses a human duration: `45s`, `30m`, `1h`, `2d`.
fn parse_lookback(input: &str) -> anyhow::Result<Duration> {
    let text = input.trim().to_lowercase();
    let scale = |raw: &str, unit: u64| -> anyhow::Result<Duration> {
        let value: u64 = raw
            .parse()
            .map_err(|_| anyhow::anyhow!("invalid look-back duration {input:?} (try 45s, 30m, 1h, 2d)"))?;
        Ok(Duration::from_secs(value * unit))
    };
    if let Some(raw) = text.strip_suffix('d') {
        return scale(raw, 24 * 60 * 60);
    }
    if let Some(raw) = text.strip_suffix('h') {
        return scale(raw, 60 * 60);
    }
    if let Some(raw) = text.strip_suffix('m') {
        return scale(raw, 60);
    }
    if let Some(raw) = text.strip_suffix('s') {
        return scale(raw, 1);
    }
    anyhow::bail!("invalid look-back duration {input:?} (try 45s, 30m, 1h, 2d)")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "merge_pilot=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_args(std::env::args().skip(1))?;
    let host = OctocrabHost::new(
        &config.owner,
        &config.repo,
        &config.base_branch,
        &config.token,
    )?;

    tracing::info!(
        owner = %config.owner,
        repo = %config.repo,
        base = %config.base_branch,
        lookback_secs = config.lookback.as_secs(),
        "running merge coordinator tick"
    );
    let summary = engine::run_tick(&host, config.lookback).await?;
    tracing::info!(
        fast_forwards = summary.fast_forwards,
        scheduled = summary.scheduled.len(),
        "tick complete"
    );
    Ok(())
}
