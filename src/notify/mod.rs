//! Delivery of the rendered digest.

pub mod serverchan;

pub use serverchan::ServerChanNotifier;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("SERVERCHAN_SENDKEY is not set")]
    MissingSendKey,

    #[error("push endpoint answered {status}: {body}")]
    Delivery { status: u16, body: String },

    #[error("push request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Pushes one titled Markdown message. A single attempt, no retries.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns the endpoint's response body on success.
    async fn send(&self, title: &str, body: &str) -> Result<String, NotifyError>;
}
