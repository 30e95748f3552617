//! Optimize runner — replays a captured page through the optimization engine
//! and prints what the visitor would have seen and what analytics received.

mod page;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use optimize_core::config::{AppConfig, SinkKind};
use tracing::info;

use crate::page::PageSnapshot;

#[derive(Parser, Debug)]
#[command(name = "optimize-runner")]
#[command(about = "Replay a page snapshot through the content optimization engine")]
#[command(version)]
struct Cli {
    /// Page snapshot (JSON)
    #[arg(long)]
    snapshot: PathBuf,

    /// Configuration file (overridden by GP_OPTIMIZE__* variables)
    #[arg(long, env = "GP_OPTIMIZE_CONFIG")]
    config: Option<PathBuf>,

    /// Analytics sink: mixpanel, datalayer, anything else disables tracking
    #[arg(long, env = "GP_OPTIMIZE__TRACKING__EVENT_TYPE")]
    event_type: Option<String>,

    /// Event name pushed to the dataLayer
    #[arg(long, env = "GP_OPTIMIZE__TRACKING__DATALAYER_EVENT_NAME")]
    datalayer_event_name: Option<String>,

    /// Seed for the weighted draw
    #[arg(long)]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "optimize_runner=info,optimize_engine=info".into()),
        )
        .json()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    if let Some(event_type) = cli.event_type {
        config.tracking.event_type = parse_sink_kind(&event_type);
    }
    if let Some(name) = cli.datalayer_event_name {
        config.tracking.datalayer_event_name = name;
    }

    info!(
        event_type = ?config.tracking.event_type,
        datalayer_event_name = %config.tracking.datalayer_event_name,
        inert_policy = ?config.engine.inert_policy,
        "Configuration loaded"
    );

    let snapshot = PageSnapshot::from_path(&cli.snapshot)
        .with_context(|| format!("loading snapshot {}", cli.snapshot.display()))?;

    let output = page::replay(snapshot, &config, cli.seed).await;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn parse_sink_kind(raw: &str) -> SinkKind {
    serde_json::from_value(serde_json::Value::String(raw.trim().to_lowercase()))
        .unwrap_or_default()
}
