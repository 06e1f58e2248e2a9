//! Network reachability state machine
//!
//! The monitor does not poll. It is fed by the platform's connectivity
//! notifications through [`NetworkMonitor::report`] and publishes the current
//! state on a watch channel for observers.

use std::fmt;
use std::time::Duration;

use serde::Serialize;
use tokio::net::TcpStream;
use tokio::sync::watch;

/// Reachability of the remote API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    Online,
    Offline,
}

impl fmt::Display for Connectivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connectivity::Online => f.write_str("online"),
            Connectivity::Offline => f.write_str("offline"),
        }
    }
}

/// Event emitted when reachability changes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    WentOnline,
    WentOffline,
}

/// Tracks reachability and notifies subscribers of transitions.
pub struct NetworkMonitor {
    state: watch::Sender<Connectivity>,
}

impl NetworkMonitor {
    /// Create a monitor seeded with the platform's current signal.
    pub fn new(initial: Connectivity) -> Self {
        let (state, _) = watch::channel(initial);
        Self { state }
    }

    pub fn is_online(&self) -> bool {
        self.current() == Connectivity::Online
    }

    pub fn current(&self) -> Connectivity {
        *self.state.borrow()
    }

    /// Apply a connectivity notification.
    ///
    /// Returns the transition it caused, or `None` when the state is unchanged.
    pub fn report(&self, connectivity: Connectivity) -> Option<Transition> {
        let changed = self.state.send_if_modified(|current| {
            if *current == connectivity {
                false
            } else {
                *current = connectivity;
                true
            }
        });

        if !changed {
            return None;
        }

        let transition = match connectivity {
            Connectivity::Online => Transition::WentOnline,
            Connectivity::Offline => Transition::WentOffline,
        };
        log::info!("Network {:?}", transition);
        Some(transition)
    }

    /// Receiver that observes every state change.
    #[allow(dead_code)]
    pub fn subscribe(&self) -> watch::Receiver<Connectivity> {
        self.state.subscribe()
    }
}

/// One-shot reachability check: can a TCP connection to `host:port` be opened?
pub async fn probe(host: &str, port: u16, timeout: Duration) -> Connectivity {
    match tokio::time::timeout(timeout, TcpStream::connect((host, port))).await {
        Ok(Ok(_)) => Connectivity::Online,
        Ok(Err(e)) => {
            log::debug!("Connectivity probe to {}:{} failed: {}", host, port, e);
            Connectivity::Offline
        }
        Err(_) => {
            log::debug!("Connectivity probe to {}:{} timed out", host, port);
            Connectivity::Offline
        }
    }
}
