//! Driver Guard - Main Entry Point
//!
//! Replays an NDJSON signal recording from stdin through a monitoring
//! session and prints every fatigue transition as a JSON line on stdout.
//!
//! Usage: `driver-guard [config.toml] < recording.ndjson`

use anyhow::Context;
use driver_guard::{init_logging, replay, PipelineConfig, Session};
use std::path::PathBuf;
use tokio::io::BufReader;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = PipelineConfig::load(config_path.as_deref())
        .context("Failed to load configuration")?;
    init_logging(&config.logging)?;

    info!("=== Driver Guard v{} ===", env!("CARGO_PKG_VERSION"));

    let handle = Session::spawn_external(config)?;
    let mut verdicts = handle.subscribe();

    let printer = tokio::spawn(async move {
        loop {
            match verdicts.recv().await {
                Ok(update) if update.edge.is_some() => {
                    println!("{}", serde_json::to_string(&update)?);
                }
                Ok(_) => {}
                Err(RecvError::Lagged(missed)) => warn!("Missed {} verdict updates", missed),
                Err(RecvError::Closed) => break,
            }
        }
        Ok::<_, serde_json::Error>(())
    });

    let stats = replay(BufReader::new(tokio::io::stdin()), &handle)
        .await
        .context("Replay failed")?;
    let telemetry = handle.snapshot();
    info!(
        "Replay finished: {} events applied, {} skipped, fatigue: {}",
        stats.applied, stats.skipped, telemetry.is_fatigue
    );

    // Dropping the last handle stops the session and closes the verdict stream
    drop(handle);
    printer.await??;

    Ok(())
}
