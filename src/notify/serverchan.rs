use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::info;

use crate::notify::{NotifyError, Notifier};

pub const DEFAULT_BASE_URL: &str = "https://sctapi.ftqq.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(25);

/// ServerChan webhook: form-encoded `title` and `desp` posted to
/// `<base>/<sendkey>.send`.
#[derive(Clone)]
pub struct ServerChanNotifier {
    client: Client,
    send_key: Option<String>,
    base_url: String,
    timeout: Duration,
}

impl ServerChanNotifier {
    pub fn new(client: Client, send_key: Option<String>) -> Self {
        Self {
            client,
            send_key: send_key.filter(|k| !k.trim().is_empty()),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self, send_key: &str) -> String {
        format!("{}/{}.send", self.base_url.trim_end_matches('/'), send_key.trim())
    }
}

#[async_trait]
impl Notifier for ServerChanNotifier {
    async fn send(&self, title: &str, body: &str) -> Result<String, NotifyError> {
        let send_key = self.send_key.as_deref().ok_or(NotifyError::MissingSendKey)?;

        let response = self
            .client
            .post(self.endpoint(send_key))
            .timeout(self.timeout)
            .form(&[("title", title), ("desp", body)])
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(NotifyError::Delivery {
                status: status.as_u16(),
                body: text,
            });
        }

        info!("Digest delivered ({} bytes)", body.len());
        Ok(text)
    }
}
