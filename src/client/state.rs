use super::connection::ConnectionStatus;
use crate::infrastructure::{Backoff, TaskManager, Timer};
use std::time::Duration;
use tokio::sync::watch;

/// Consolidated mutable state for NotificationClient
/// Using a single struct reduces lock contention
pub struct ClientState {
    /// Token from the last `connect` call, reused by reconnect attempts
    pub token: Option<String>,

    /// Backoff timer; its attempt count is the reconnect attempt counter
    pub reconnect_timer: Timer,

    /// Whether the disconnect was manual (prevents auto-reconnect)
    pub was_manual_disconnect: bool,

    /// Bumped on every connect/disconnect so late events from an old transport are ignored
    pub epoch: u64,

    /// Background task manager
    pub task_manager: TaskManager,

    /// Sender for status change notifications
    pub status_tx: watch::Sender<ConnectionStatus>,
}

impl ClientState {
    pub fn new(backoff: Backoff) -> Self {
        let (status_tx, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            token: None,
            reconnect_timer: Timer::new(backoff),
            was_manual_disconnect: false,
            epoch: 0,
            task_manager: TaskManager::new(),
            status_tx,
        }
    }

    /// Start a new connection epoch and return it
    pub fn next_epoch(&mut self) -> u64 {
        self.epoch += 1;
        self.epoch
    }

    pub fn reconnect_attempts(&self) -> u32 {
        self.reconnect_timer.attempts()
    }

    /// Record an unintended close and pick the delay for the next attempt.
    ///
    /// Returns `None` after a manual disconnect or once attempts are exhausted.
    pub fn schedule_reconnect(&mut self) -> Option<Duration> {
        if self.was_manual_disconnect {
            tracing::info!("Manual disconnect detected, will not attempt to reconnect");
            return None;
        }

        let delay = self.reconnect_timer.next_delay();
        match delay {
            Some(delay) => tracing::info!(
                "Scheduling reconnect attempt {} in {:?}",
                self.reconnect_timer.attempts(),
                delay
            ),
            None => tracing::warn!(
                "Giving up after {} reconnect attempts; call connect() to retry",
                self.reconnect_timer.attempts()
            ),
        }
        delay
    }

    /// Notify status watchers
    pub fn notify_status(&self, status: ConnectionStatus) {
        self.status_tx.send_replace(status);
    }
}

impl Default for ClientState {
    fn default() -> Self {
        Self::new(Backoff::default())
    }
}
