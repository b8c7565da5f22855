//! Network reachability tracking.
//!
//! [`ConnectivityMonitor`] owns the latest reachability flag and republishes
//! every transition to its subscribers. [`ReachabilityProbe`] derives the flag
//! from a TCP connect with a timeout and pushes results into a monitor.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::policy::PolicyEvent;

/// Latest known reachability, shared through a watch channel.
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    sender: Arc<watch::Sender<bool>>,
}

impl ConnectivityMonitor {
    pub fn new(initially_connected: bool) -> Self {
        let (sender, _) = watch::channel(initially_connected);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn is_connected(&self) -> bool {
        *self.sender.borrow()
    }

    /// Publish `connected`; subscribers are only woken on a real transition.
    pub fn set(&self, connected: bool) -> bool {
        let changed = self.sender.send_if_modified(|current| {
            if *current == connected {
                false
            } else {
                *current = connected;
                true
            }
        });
        if changed {
            tracing::info!(connected, "connectivity changed");
        }
        changed
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.sender.subscribe()
    }

    /// Forward each transition into a policy event channel until either side
    /// goes away.
    pub fn forward_to(&self, events: mpsc::Sender<PolicyEvent>) -> JoinHandle<()> {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            while receiver.changed().await.is_ok() {
                let connected = *receiver.borrow_and_update();
                if events.send(PolicyEvent::Connectivity(connected)).await.is_err() {
                    break;
                }
            }
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Shortest interval `spawn` will tick at.
const MIN_PROBE_INTERVAL: Duration = Duration::from_millis(100);

/// TCP-connect reachability check.
#[derive(Debug, Clone)]
pub struct ReachabilityProbe {
    addr: String,
    timeout: Duration,
    interval: Duration,
}

impl ReachabilityProbe {
    pub fn new(addr: impl Into<String>, timeout: Duration, interval: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
            interval,
        }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// One connect attempt; any failure or timeout counts as offline.
    pub async fn probe_once(&self) -> bool {
        match tokio::time::timeout(self.timeout, TcpStream::connect(&self.addr)).await {
            Ok(Ok(_)) => true,
            Ok(Err(error)) => {
                tracing::debug!(addr = %self.addr, %error, "reachability probe failed");
                false
            }
            Err(_) => {
                tracing::debug!(addr = %self.addr, timeout_ms = self.timeout.as_millis() as u64, "reachability probe timed out");
                false
            }
        }
    }

    /// Probe on the configured interval and publish into `monitor`.
    pub fn spawn(self, monitor: ConnectivityMonitor) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval.max(MIN_PROBE_INTERVAL));
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let connected = self.probe_once().await;
                monitor.set(connected);
            }
        })
    }
}

impl Default for ReachabilityProbe {
    fn default() -> Self {
        Self::new(
            "1.1.1.1:53",
            Duration::from_millis(1_500),
            Duration::from_secs(5),
        )
    }
}
