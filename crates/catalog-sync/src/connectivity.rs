//! # Connectivity Monitor
//!
//! A single boolean "can we reach the API" signal with change notification.
//!
//! ## Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    ConnectivitySource                                   │
//! │                                                                         │
//! │  ManualConnectivity            ProbeConnectivity                       │
//! │  ──────────────────            ─────────────────                       │
//! │  set(true/false)               every probe_interval:                   │
//! │  (tests, --offline)              TCP connect(api host, port)           │
//! │        │                         within probe_timeout                  │
//! │        │                               │                               │
//! │        └──────────────┬────────────────┘                               │
//! │                       ▼                                                 │
//! │           watch::Sender<bool>::send_if_modified                        │
//! │                       │  (subscribers wake only on a real change)      │
//! │                       ▼                                                 │
//! │           watch::Receiver<bool>  ──►  SubmissionCoordinator            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! There are no error conditions: a probe that cannot run counts as
//! "disconnected", and no signal at all means the last value stands.

use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::ClientConfig;
use crate::error::{SyncError, SyncResult};

/// Source of the connectivity signal.
///
/// Implementations must only notify subscribers when the value changes, but
/// consumers still treat repeated values as harmless.
pub trait ConnectivitySource: Send + Sync {
    /// Current state.
    fn is_connected(&self) -> bool;

    /// Receiver that wakes on every change.
    fn subscribe(&self) -> watch::Receiver<bool>;
}

/// Publishes `connected` and reports whether the value changed.
fn publish(tx: &watch::Sender<bool>, connected: bool) -> bool {
    tx.send_if_modified(|current| {
        if *current == connected {
            false
        } else {
            *current = connected;
            true
        }
    })
}

// =============================================================================
// Manual Connectivity
// =============================================================================

/// Connectivity set explicitly by the caller.
#[derive(Debug, Clone)]
pub struct ManualConnectivity {
    tx: Arc<watch::Sender<bool>>,
}

impl ManualConnectivity {
    pub fn new(connected: bool) -> Self {
        let (tx, _rx) = watch::channel(connected);
        ManualConnectivity { tx: Arc::new(tx) }
    }

    /// Sets the state. Returns true if it changed.
    pub fn set(&self, connected: bool) -> bool {
        let changed = publish(&self.tx, connected);
        if changed {
            debug!(connected, "Connectivity set manually");
        }
        changed
    }
}

impl ConnectivitySource for ManualConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

// =============================================================================
// Probe Connectivity
// =============================================================================

/// Periodically checks that the API host accepts TCP connections.
///
/// The initial state is the result of one probe run before `spawn` returns,
/// so a caller never sees "disconnected" for a host that is reachable.
#[derive(Debug)]
pub struct ProbeConnectivity {
    tx: Arc<watch::Sender<bool>>,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl ProbeConnectivity {
    /// Spawns a probe using the API URL and probe settings from `config`.
    pub async fn from_config(config: &ClientConfig) -> SyncResult<Self> {
        Self::spawn(
            &config.api.base_url,
            config.probe_interval(),
            config.probe_timeout(),
        )
        .await
    }

    /// Spawns a probe against the host and port of `api_url`.
    ///
    /// ## Errors
    /// `InvalidUrl` when the URL has no host or no known port.
    pub async fn spawn(api_url: &str, interval: Duration, timeout: Duration) -> SyncResult<Self> {
        let url = url::Url::parse(api_url)?;
        let host = url
            .host_str()
            .ok_or_else(|| SyncError::InvalidUrl(format!("No host in {}", api_url)))?
            .to_string();
        let port = url
            .port_or_known_default()
            .ok_or_else(|| SyncError::InvalidUrl(format!("No port for {}", api_url)))?;

        let connected = probe_once(&host, port, timeout).await;
        let (tx, _rx) = watch::channel(connected);
        let tx = Arc::new(tx);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        info!(host = %host, port, ?interval, connected, "Starting connectivity probe");

        let task = tokio::spawn(Self::run(
            tx.clone(),
            host,
            port,
            interval,
            timeout,
            shutdown_rx,
        ));

        Ok(ProbeConnectivity {
            tx,
            shutdown_tx,
            task,
        })
    }

    /// Stops the probe. The last published value stays readable.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
    }

    async fn run(
        tx: Arc<watch::Sender<bool>>,
        host: String,
        port: u16,
        interval: Duration,
        timeout: Duration,
        mut shutdown_rx: mpsc::Receiver<()>,
    ) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // Immediate tick; spawn already probed once
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let reachable = probe_once(&host, port, timeout).await;
                    if publish(&tx, reachable) {
                        info!(connected = reachable, host = %host, "Connectivity changed");
                    }
                }

                _ = shutdown_rx.recv() => {
                    debug!("Connectivity probe received shutdown");
                    break;
                }
            }
        }
    }
}

impl ConnectivitySource for ProbeConnectivity {
    fn is_connected(&self) -> bool {
        *self.tx.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Drop for ProbeConnectivity {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One reachability check: can a TCP connection be opened in time?
async fn probe_once(host: &str, port: u16, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[test]
    fn test_manual_notifies_only_on_change() {
        let conn = ManualConnectivity::new(false);
        let mut rx = conn.subscribe();

        assert!(!conn.set(false));
        assert!(!rx.has_changed().unwrap());

        assert!(conn.set(true));
        assert!(rx.has_changed().unwrap());
        assert!(*rx.borrow_and_update());
        assert!(conn.is_connected());
    }

    #[test]
    fn test_manual_clones_share_state() {
        let conn = ManualConnectivity::new(true);
        let other = conn.clone();
        other.set(false);
        assert!(!conn.is_connected());
    }

    #[tokio::test]
    async fn test_probe_rejects_url_without_host() {
        let result = ProbeConnectivity::spawn(
            "unix:/tmp/socket",
            Duration::from_secs(1),
            Duration::from_millis(100),
        )
        .await;
        assert!(matches!(result, Err(SyncError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_probe_follows_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let probe = ProbeConnectivity::spawn(
            &format!("http://127.0.0.1:{}", port),
            Duration::from_millis(20),
            Duration::from_millis(200),
        )
        .await
        .unwrap();
        assert!(probe.is_connected());
        let mut rx = probe.subscribe();

        drop(listener);

        tokio::time::timeout(Duration::from_secs(5), rx.wait_for(|c| !*c))
            .await
            .unwrap()
            .unwrap();
        assert!(!probe.is_connected());

        probe.shutdown().await;
    }

    #[tokio::test]
    async fn test_probe_starts_disconnected_when_nothing_listens() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let probe = ProbeConnectivity::spawn(
            &format!("http://127.0.0.1:{}", port),
            Duration::from_secs(60),
            Duration::from_millis(200),
        )
        .await
        .unwrap();

        assert!(!probe.is_connected());
        probe.shutdown().await;
    }
}
