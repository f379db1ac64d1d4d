use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::NotifyError;
use crate::notifier::Notifier;

const DEFAULT_API_BASE: &str = "https://api.telegram.org";
const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Credentials and destination for the Telegram channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// Posts messages to a Telegram chat through the Bot API.
#[derive(Clone, Debug)]
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(config: &TelegramConfig) -> Result<Self, NotifyError> {
        if config.bot_token.trim().is_empty() {
            return Err(NotifyError::Config("telegram bot_token is empty".into()));
        }
        if config.chat_id.trim().is_empty() {
            return Err(NotifyError::Config("telegram chat_id is empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                config.api_base.trim_end_matches('/'),
                config.bot_token
            ),
            chat_id: config.chat_id.clone(),
        })
    }

    /// Target chat identifier.
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }
}

/// The request URL carries the bot token, so it never reaches an error.
fn redact(err: reqwest::Error) -> NotifyError {
    NotifyError::Transport(err.without_url())
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, message: &str) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "chat_id": self.chat_id, "text": message }))
            .send()
            .await
            .map_err(redact)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.map_err(redact)?;
            return Err(NotifyError::Rejected { status: status.as_u16(), body });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, Uri};
    use axum::{Json, Router};
    use serde_json::Value;
    use tokio::net::TcpListener;
    use tokio::sync::mpsc;

    fn config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "123:abc".into(),
            chat_id: "42".into(),
            api_base: "https://telegram.example/".into(),
        }
    }

    #[test]
    fn endpoint_embeds_token() {
        let notifier = TelegramNotifier::new(&config()).unwrap();
        assert_eq!(notifier.endpoint, "https://telegram.example/bot123:abc/sendMessage");
        assert_eq!(notifier.chat_id(), "42");
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let mut c = config();
        c.bot_token = " ".into();
        assert!(matches!(TelegramNotifier::new(&c), Err(NotifyError::Config(_))));

        let mut c = config();
        c.chat_id.clear();
        assert!(matches!(TelegramNotifier::new(&c), Err(NotifyError::Config(_))));
    }

    // ---- Delivery against a local Bot API ----

    async fn serve_stub(app: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn pointed_at(api_base: String) -> TelegramNotifier {
        TelegramNotifier::new(&TelegramConfig { api_base, ..config() }).unwrap()
    }

    #[tokio::test]
    async fn send_posts_chat_and_text() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let app = Router::new().fallback(move |uri: Uri, Json(body): Json<Value>| {
            let tx = tx.clone();
            async move {
                let _ = tx.send((uri.path().to_string(), body));
                Json(json!({ "ok": true }))
            }
        });
        let notifier = pointed_at(serve_stub(app).await);

        notifier.send("Dune is overdue").await.unwrap();
        let (path, body) = rx.recv().await.unwrap();
        assert_eq!(path, "/bot123:abc/sendMessage");
        assert_eq!(body, json!({ "chat_id": "42", "text": "Dune is overdue" }));
    }

    #[tokio::test]
    async fn refused_message_is_rejected_with_body() {
        let app = Router::new().fallback(|| async {
            (
                StatusCode::FORBIDDEN,
                Json(json!({ "ok": false, "description": "Forbidden: bot was blocked by the user" })),
            )
        });
        let notifier = pointed_at(serve_stub(app).await);

        match notifier.send("hello").await {
            Err(NotifyError::Rejected { status, body }) => {
                assert_eq!(status, 403);
                assert!(body.contains("blocked"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_errors_do_not_leak_the_token() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let notifier = TelegramNotifier::new(&TelegramConfig {
            bot_token: "123:SECRETTOKEN".into(),
            chat_id: "42".into(),
            api_base: format!("http://{addr}"),
        })
        .unwrap();

        let err = notifier.send("hello").await.unwrap_err();
        assert!(matches!(err, NotifyError::Transport(_)));
        assert!(!err.to_string().contains("SECRETTOKEN"));
        assert!(!format!("{err:?}").contains("SECRETTOKEN"));
    }

    #[test]
    fn api_base_defaults_when_omitted() {
        let c: TelegramConfig =
            serde_json::from_str(r#"{"bot_token":"t","chat_id":"1"}"#).unwrap();
        assert_eq!(c.api_base, DEFAULT_API_BASE);
    }
}
