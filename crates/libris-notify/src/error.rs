use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// The channel could not be reached.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The channel answered but refused the message.
    #[error("channel rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("configuration error: {0}")]
    Config(String),

    /// Used by test doubles to simulate an unreachable channel.
    #[error("channel unavailable: {0}")]
    Unavailable(String),
}
