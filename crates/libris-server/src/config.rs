use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use libris_billing::StripeConfig;
use libris_notify::{QueueConfig, TelegramConfig};
use libris_types::UserId;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Top-level configuration, usually read from `libris.toml`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LibrisConfig {
    pub server: ServerSection,
    pub billing: BillingSection,
    pub notify: NotifySection,
    pub sweep: SweepSection,
    pub users: Vec<UserEntry>,
}

impl LibrisConfig {
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text).map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    pub fn from_toml(text: &str) -> ServerResult<Self> {
        toml::from_str(text).map_err(|e| ServerError::Config(e.to_string()))
    }

    pub fn to_toml(&self) -> ServerResult<String> {
        toml::to_string_pretty(self).map_err(|e| ServerError::Config(e.to_string()))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: SocketAddr,
    /// Base URL the payment provider redirects customers back to.
    pub public_url: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::LOCALHOST, 8000)),
            public_url: "http://127.0.0.1:8000".into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BillingSection {
    pub currency: String,
    /// Without this, sessions are kept in memory and never paid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stripe: Option<StripeConfig>,
}

impl Default for BillingSection {
    fn default() -> Self {
        Self { currency: "usd".into(), stripe: None }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifySection {
    /// Without this, notifications are written to the log.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub telegram: Option<TelegramConfig>,
    pub max_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl NotifySection {
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            max_attempts: self.max_attempts,
            retry_backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl Default for NotifySection {
    fn default() -> Self {
        let queue = QueueConfig::default();
        Self {
            telegram: None,
            max_attempts: queue.max_attempts,
            retry_backoff_ms: u64::try_from(queue.retry_backoff.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepSection {
    pub enabled: bool,
    pub interval_secs: u64,
}

impl Default for SweepSection {
    fn default() -> Self {
        Self { enabled: true, interval_secs: 24 * 60 * 60 }
    }
}

/// An account provisioned at startup, with the bearer token it signs in
/// with.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    pub email: String,
    pub token: String,
    #[serde(default)]
    pub is_staff: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = LibrisConfig::default();
        assert_eq!(c.server.bind_addr, "127.0.0.1:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(c.billing.currency, "usd");
        assert!(c.billing.stripe.is_none());
        assert_eq!(c.notify.queue_config(), QueueConfig::default());
        assert_eq!(c.sweep.interval_secs, 86_400);
        assert!(c.users.is_empty());
    }

    #[test]
    fn default_survives_toml() {
        let c = LibrisConfig::default();
        let text = c.to_toml().unwrap();
        assert_eq!(LibrisConfig::from_toml(&text).unwrap(), c);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[server]
bind_addr = "0.0.0.0:9000"

[billing.stripe]
secret_key = "sk_test_123"

[notify.telegram]
bot_token = "123:abc"
chat_id = "42"

[[users]]
email = "staff@example.com"
token = "staff-token"
is_staff = true

[[users]]
email = "reader@example.com"
token = "reader-token"
"#
        )
        .unwrap();

        let c = LibrisConfig::load(file.path()).unwrap();
        assert_eq!(c.server.bind_addr.port(), 9000);
        assert_eq!(c.server.public_url, ServerSection::default().public_url);
        assert_eq!(c.billing.stripe.unwrap().api_base, "https://api.stripe.com");
        assert_eq!(c.notify.telegram.unwrap().chat_id, "42");
        assert_eq!(c.notify.max_attempts, 3);
        assert!(c.sweep.enabled);
        assert_eq!(c.users.len(), 2);
        assert!(c.users[0].is_staff);
        assert!(!c.users[1].is_staff);
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        assert!(matches!(
            LibrisConfig::from_toml("[server]\nbind_addr = 5"),
            Err(ServerError::Config(_))
        ));
    }
}
