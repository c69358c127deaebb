use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::translate::{check_status, pace, FallbackTranslator, TranslateError};

pub const DEFAULT_URL: &str = "https://api.mymemory.translated.net/get";
pub const DEFAULT_LANGPAIR: &str = "en|zh-CN";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(500);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Keyless per-title translation. Never fails: a title that cannot be
/// translated is passed through unchanged.
pub struct MyMemoryTranslator {
    client: Client,
    url: String,
    langpair: String,
    interval: Duration,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MyMemoryResponse {
    response_data: Option<ResponseData>,
    /// MyMemory reports quota and input errors here, with HTTP 200.
    response_status: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseData {
    translated_text: Option<String>,
}

impl MyMemoryTranslator {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            url: DEFAULT_URL.to_string(),
            langpair: DEFAULT_LANGPAIR.to_string(),
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_langpair(mut self, langpair: impl Into<String>) -> Self {
        self.langpair = langpair.into();
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn translate_one(&self, text: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("q", text), ("langpair", self.langpair.as_str())])
            .timeout(self.timeout)
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: MyMemoryResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        extract_translation(body, text)
    }
}

/// Status codes arrive as numbers or strings depending on the endpoint.
fn status_code(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn extract_translation(body: MyMemoryResponse, original: &str) -> Result<String, TranslateError> {
    if let Some(code) = body.response_status.as_ref().and_then(status_code) {
        if code != 200 {
            let detail = body
                .response_data
                .and_then(|d| d.translated_text)
                .unwrap_or_default();
            return Err(TranslateError::Status {
                status: code.min(u16::MAX as u64) as u16,
                body: detail,
            });
        }
    }

    let text = body
        .response_data
        .and_then(|d| d.translated_text)
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| original.to_string());
    Ok(text)
}

#[async_trait]
impl FallbackTranslator for MyMemoryTranslator {
    fn name(&self) -> &'static str {
        "mymemory"
    }

    async fn translate_all(&self, titles: &[String]) -> Vec<String> {
        let mut out = Vec::with_capacity(titles.len());
        for title in titles {
            match self.translate_one(title).await {
                Ok(text) => out.push(text),
                Err(e) => {
                    warn!("MyMemory could not translate {:?}, keeping original: {}", title, e);
                    out.push(title.clone());
                }
            }
            pace(self.interval).await;
        }
        out
    }
}
