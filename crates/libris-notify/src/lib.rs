//! Outbound notifications for Libris.
//!
//! Domain events (a new borrowing, an overdue loan, a settled payment) are
//! rendered as plain-text [`Notification`]s and pushed onto a
//! [`NotificationQueue`]. A single background worker drains the queue and
//! hands each message to the configured [`Notifier`]. Enqueueing never
//! blocks and never fails the caller; delivery problems are logged and
//! retried a bounded number of times by the worker only.
//!
//! # Channels
//!
//! - [`TelegramNotifier`] -- Telegram Bot API `sendMessage`
//! - [`LogNotifier`] -- writes messages to the tracing log
//! - [`InMemoryNotifier`] -- records messages for tests

pub mod error;
pub mod message;
pub mod notifier;
pub mod queue;
pub mod telegram;

pub use error::NotifyError;
pub use message::Notification;
pub use notifier::{InMemoryNotifier, LogNotifier, Notifier};
pub use queue::{run_worker, NotificationQueue, QueueConfig};
pub use telegram::{TelegramConfig, TelegramNotifier};
