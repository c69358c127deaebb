use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::translate::{check_status, pace, TranslateError, Translator};

pub const FREE_URL: &str = "https://api-free.deepl.com/v2/translate";
pub const PRO_URL: &str = "https://api.deepl.com/v2/translate";
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(350);
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// One request per title. A single failure fails the whole batch so the
/// chain can try the next provider with a clean slate.
pub struct DeeplTranslator {
    client: Client,
    api_key: Option<String>,
    /// Overrides the host picked from the key plan.
    url: Option<String>,
    interval: Duration,
    timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct DeeplResponse {
    translations: Vec<DeeplTranslation>,
}

#[derive(Debug, Deserialize)]
struct DeeplTranslation {
    text: String,
}

impl DeeplTranslator {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            url: None,
            interval: DEFAULT_INTERVAL,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
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

    async fn translate_one(&self, api_key: &str, text: &str) -> Result<String, TranslateError> {
        let response = self
            .client
            .post(self.url.as_deref().unwrap_or_else(|| endpoint_for(api_key)))
            .header("Authorization", format!("DeepL-Auth-Key {}", api_key))
            .timeout(self.timeout)
            .form(&[("text", text), ("target_lang", "ZH")])
            .send()
            .await?;
        let response = check_status(response).await?;

        let body: DeeplResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        first_translation(body)
    }
}

/// Free-plan keys carry a `:fx` suffix and only work on the free host.
fn endpoint_for(api_key: &str) -> &'static str {
    if api_key.ends_with(":fx") {
        FREE_URL
    } else {
        PRO_URL
    }
}

fn first_translation(body: DeeplResponse) -> Result<String, TranslateError> {
    body.translations
        .into_iter()
        .next()
        .map(|t| t.text)
        .ok_or_else(|| TranslateError::Parse("empty translations list".into()))
}

#[async_trait]
impl Translator for DeeplTranslator {
    fn name(&self) -> &'static str {
        "deepl"
    }

    async fn translate_batch(&self, titles: &[String]) -> Result<Vec<String>, TranslateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TranslateError::Unavailable("DEEPL_API_KEY"))?;

        let mut out = Vec::with_capacity(titles.len());
        for title in titles {
            out.push(self.translate_one(api_key, title).await?);
            pace(self.interval).await;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_follows_key_plan() {
        assert_eq!(endpoint_for("abc-123:fx"), FREE_URL);
        assert_eq!(endpoint_for("abc-123"), PRO_URL);
    }

    #[test]
    fn test_first_translation() {
        let body: DeeplResponse = serde_json::from_str(
            r#"{"translations":[{"detected_source_language":"EN","text":"地震袭击该地区"}]}"#,
        )
        .unwrap();
        assert_eq!(first_translation(body).unwrap(), "地震袭击该地区");
    }

    #[test]
    fn test_empty_translations_is_an_error() {
        let body: DeeplResponse = serde_json::from_str(r#"{"translations":[]}"#).unwrap();
        assert!(matches!(first_translation(body), Err(TranslateError::Parse(_))));
    }

    #[tokio::test]
    async fn test_one_failed_title_fails_the_batch() {
        let translator = DeeplTranslator::new(Client::new(), Some("key:fx".into()))
            .with_url("http://127.0.0.1:9/v2/translate")
            .with_interval(Duration::ZERO)
            .with_timeout(Duration::from_millis(200));

        let titles = vec!["Quake".to_string(), "Storm".to_string()];
        let result = translator.translate_batch(&titles).await;
        assert!(matches!(result, Err(TranslateError::Http(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let translator = DeeplTranslator::new(Client::new(), None);
        let result = translator.translate_batch(&["Quake".to_string()]).await;
        assert!(matches!(result, Err(TranslateError::Unavailable("DEEPL_API_KEY"))));
    }
}
