//! # Sync Commands
//!
//! ```text
//! catalog pending   - list the offline queue
//! catalog status    - connectivity, queue and catalog counts
//! catalog sync      - wait for connectivity, replay once, report
//! catalog watch     - replay on every reconnect until Ctrl-C
//! ```

use std::time::Duration;

use anyhow::bail;
use serde::Serialize;
use tracing::info;

use catalog_core::PendingSubmission;
use catalog_sync::{CoordinatorStatus, ReplayReport};

use super::print_json;
use crate::state::AppState;
use crate::{OutputFormat, SyncArgs};

/// Queue entry as printed by the CLI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingDto {
    pub id: String,
    pub name: String,
    pub product_type: String,
    pub price: f64,
    pub tax: f64,
    pub queued_at: String,
}

impl From<PendingSubmission> for PendingDto {
    fn from(p: PendingSubmission) -> Self {
        PendingDto {
            id: p.id,
            name: p.record.product_name,
            product_type: p.record.product_type,
            price: p.record.price,
            tax: p.record.tax,
            queued_at: p.queued_at.to_rfc3339(),
        }
    }
}

/// Status as printed by the CLI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusDto {
    pub is_connected: bool,
    pub offline_mode: bool,
    pub pending_count: usize,
    pub catalog_size: usize,
    pub replay_in_flight: bool,
    pub last_replay: Option<ReplayReport>,
}

impl StatusDto {
    fn new(status: CoordinatorStatus, offline_mode: bool) -> Self {
        StatusDto {
            is_connected: status.is_connected,
            offline_mode,
            pending_count: status.pending_count,
            catalog_size: status.catalog_size,
            replay_in_flight: status.replay_in_flight,
            last_replay: status.last_replay,
        }
    }
}

pub async fn pending(app: &AppState, output: OutputFormat) -> anyhow::Result<()> {
    let entries: Vec<PendingDto> = app
        .handle
        .pending()
        .await?
        .into_iter()
        .map(PendingDto::from)
        .collect();

    match output {
        OutputFormat::Json => print_json(&entries)?,
        OutputFormat::Pretty => {
            if entries.is_empty() {
                println!("Offline queue is empty.");
            }
            for e in &entries {
                println!("{}  {}  {:.2}  queued {}", e.id, e.name, e.price, e.queued_at);
            }
        }
    }

    Ok(())
}

pub async fn status(app: &AppState, output: OutputFormat) -> anyhow::Result<()> {
    let status = StatusDto::new(
        app.handle.status().await?,
        app.connectivity.is_offline_mode(),
    );

    match output {
        OutputFormat::Json => print_json(&status)?,
        OutputFormat::Pretty => {
            let state = if status.offline_mode {
                "offline (forced)"
            } else if status.is_connected {
                "online"
            } else {
                "offline"
            };
            println!("Connectivity: {}", state);
            println!("Pending:      {}", status.pending_count);
            println!("Catalog:      {}", status.catalog_size);
        }
    }

    Ok(())
}

/// Waits up to `--wait-secs` for connectivity, then replays the queue once.
pub async fn sync(app: &AppState, args: SyncArgs, output: OutputFormat) -> anyhow::Result<()> {
    if app.connectivity.is_offline_mode() {
        bail!("cannot sync with --offline");
    }

    let mut rx = app.connectivity.source().subscribe();
    if !*rx.borrow_and_update() {
        info!(wait_secs = args.wait_secs, "Waiting for connectivity");
        let wait = Duration::from_secs(args.wait_secs);
        if tokio::time::timeout(wait, rx.wait_for(|connected| *connected))
            .await
            .is_err()
        {
            bail!("no connectivity after {} seconds", args.wait_secs);
        }
    }

    let report = app.handle.replay_now().await?;

    match output {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Pretty => println!(
            "Sent {} of {} queued products, {} still pending.",
            report.confirmed, report.attempted, report.remaining
        ),
    }

    Ok(())
}

/// Keeps the coordinator running so every reconnect triggers a replay.
pub async fn watch(app: &AppState) -> anyhow::Result<()> {
    let status = app.handle.status().await?;
    info!(
        connected = status.is_connected,
        pending = status.pending_count,
        "Watching connectivity, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c().await?;

    info!("Stopping");
    Ok(())
}
