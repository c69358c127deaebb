use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::translate::{check_status, TranslateError, Translator};

pub const DEFAULT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(40);

const PROMPT: &str =
    "将以下英文新闻标题逐条翻译成简洁的中文（保留专有名词），只返回JSON数组，不要其他文字：\n";

/// Batch translation through an OpenAI-compatible chat completions endpoint.
/// The whole list goes out in one request and must come back as a JSON array
/// of the same length.
pub struct OpenAiTranslator {
    client: Client,
    api_key: Option<String>,
    url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiTranslator {
    pub fn new(client: Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            url: DEFAULT_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

fn build_prompt(titles: &[String]) -> Result<String, TranslateError> {
    let list = serde_json::to_string(titles).map_err(|e| TranslateError::Parse(e.to_string()))?;
    Ok(format!("{}{}", PROMPT, list))
}

/// Models like to wrap JSON in a Markdown fence even when told not to.
fn strip_code_fence(s: &str) -> &str {
    let s = s.trim();
    let Some(rest) = s.strip_prefix("```") else {
        return s;
    };
    let body = rest.split_once('\n').map(|(_, body)| body).unwrap_or_default();
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse the model's reply into exactly `expected` titles.
fn parse_reply(content: &str, expected: usize) -> Result<Vec<String>, TranslateError> {
    let values: Vec<Value> = serde_json::from_str(strip_code_fence(content))
        .map_err(|e| TranslateError::Parse(format!("reply is not a JSON array: {}", e)))?;

    if values.len() != expected {
        return Err(TranslateError::LengthMismatch {
            expected,
            got: values.len(),
        });
    }

    Ok(values
        .into_iter()
        .map(|v| match v {
            Value::String(s) => s.trim().to_string(),
            other => other.to_string().trim().to_string(),
        })
        .collect())
}

#[async_trait]
impl Translator for OpenAiTranslator {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn translate_batch(&self, titles: &[String]) -> Result<Vec<String>, TranslateError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(TranslateError::Unavailable("OPENAI_API_KEY"))?;

        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: build_prompt(titles)?,
            }],
            temperature: 0.2,
        };

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let reply: ChatResponse = response
            .json()
            .await
            .map_err(|e| TranslateError::Parse(e.to_string()))?;
        let content = reply
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| TranslateError::Parse("reply has no message content".into()))?;

        parse_reply(&content, titles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_keeps_titles_as_json() {
        let prompt = build_prompt(&["Quake \"hits\"".to_string(), "Storm".to_string()]).unwrap();
        assert!(prompt.starts_with(PROMPT));
        assert!(prompt.ends_with(r#"["Quake \"hits\"","Storm"]"#));
    }

    #[test]
    fn test_parse_reply_plain_array() {
        let out = parse_reply(r#"[" 地震袭击该地区 ", "风暴逼近"]"#, 2).unwrap();
        assert_eq!(out, vec!["地震袭击该地区", "风暴逼近"]);
    }

    #[test]
    fn test_parse_reply_fenced_array() {
        let reply = "```json\n[\"地震\", \"风暴\"]\n```";
        assert_eq!(parse_reply(reply, 2).unwrap(), vec!["地震", "风暴"]);
    }

    #[test]
    fn test_parse_reply_stringifies_non_strings() {
        assert_eq!(parse_reply("[1, \"二\"]", 2).unwrap(), vec!["1", "二"]);
    }

    #[test]
    fn test_parse_reply_length_mismatch() {
        match parse_reply(r#"["地震"]"#, 2) {
            Err(TranslateError::LengthMismatch { expected: 2, got: 1 }) => {}
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_parse_reply_rejects_prose() {
        assert!(matches!(
            parse_reply("以下是翻译：地震", 1),
            Err(TranslateError::Parse(_))
        ));
        assert!(matches!(
            parse_reply(r#"{"titles": ["地震"]}"#, 1),
            Err(TranslateError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_transport_failure_is_an_error() {
        let translator = OpenAiTranslator::new(Client::new(), Some("sk-test".into()))
            .with_url("http://127.0.0.1:9/v1/chat/completions")
            .with_timeout(Duration::from_millis(200));

        let result = translator.translate_batch(&["Quake".to_string()]).await;
        assert!(matches!(result, Err(TranslateError::Http(_))));
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let translator = OpenAiTranslator::new(Client::new(), None);
        let result = translator.translate_batch(&["Quake".to_string()]).await;
        assert!(matches!(result, Err(TranslateError::Unavailable("OPENAI_API_KEY"))));
    }
}
