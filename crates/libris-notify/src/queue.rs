use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::message::Notification;
use crate::notifier::Notifier;

/// Delivery policy for the background worker.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QueueConfig {
    /// Attempts per message, including the first. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause before the n-th retry is `retry_backoff * n`.
    pub retry_backoff: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_backoff: Duration::from_millis(500),
        }
    }
}

/// Handle for submitting notifications to the background worker.
///
/// Cloning is cheap; all clones feed the same worker. The worker exits once
/// every handle has been dropped and the backlog is drained.
#[derive(Clone, Debug)]
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Create a queue whose receiving end is returned to the caller instead
    /// of being attached to a worker.
    pub fn unbounded() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Create a queue and spawn its delivery worker on the current tokio
    /// runtime.
    pub fn spawn(notifier: Arc<dyn Notifier>, config: QueueConfig) -> (Self, JoinHandle<()>) {
        let (queue, rx) = Self::unbounded();
        let worker = tokio::spawn(run_worker(rx, notifier, config));
        (queue, worker)
    }

    /// Submit a notification without waiting for delivery.
    ///
    /// Returns `false` if the worker is gone; the message is dropped and a
    /// warning logged.
    pub fn enqueue(&self, notification: Notification) -> bool {
        let kind = notification.kind();
        match self.tx.send(notification) {
            Ok(()) => {
                debug!(kind, "notification queued");
                true
            }
            Err(_) => {
                warn!(kind, "notification worker stopped; message dropped");
                false
            }
        }
    }
}

/// Drain `rx`, delivering each message through `notifier`.
pub async fn run_worker(
    mut rx: mpsc::UnboundedReceiver<Notification>,
    notifier: Arc<dyn Notifier>,
    config: QueueConfig,
) {
    let max_attempts = config.max_attempts.max(1);
    info!(max_attempts, "notification worker started");

    while let Some(notification) = rx.recv().await {
        let kind = notification.kind();
        let text = notification.to_string();

        for attempt in 1..=max_attempts {
            match notifier.send(&text).await {
                Ok(()) => {
                    debug!(kind, attempt, "notification delivered");
                    break;
                }
                Err(e) if attempt < max_attempts => {
                    warn!(kind, attempt, error = %e, "notification delivery failed; retrying");
                    tokio::time::sleep(config.retry_backoff * attempt).await;
                }
                Err(e) => {
                    warn!(kind, attempt, error = %e, "notification delivery failed; giving up");
                }
            }
        }
    }

    info!("notification worker stopped");
}
