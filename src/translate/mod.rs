//! Headline translation into Chinese through an ordered chain of providers.
//!
//! ```text
//! OpenAI (batch) → DeepL (per title) → MyMemory (per title, never fails)
//! ```
//!
//! Providers whose credential is missing report [`TranslateError::Unavailable`]
//! and the chain moves on, so a run with no keys at all still ends at
//! MyMemory.

pub mod deepl;
pub mod mymemory;
pub mod openai;

pub use deepl::DeeplTranslator;
pub use mymemory::MyMemoryTranslator;
pub use openai::OpenAiTranslator;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

/// How many leading characters [`looks_chinese`] inspects.
const DETECT_PREFIX_CHARS: usize = 8;

#[derive(Debug, Error)]
pub enum TranslateError {
    #[error("{0} is not configured")]
    Unavailable(&'static str),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("expected {expected} translations, got {got}")]
    LengthMismatch { expected: usize, got: usize },
}

/// A provider that may fail as a whole.
#[async_trait]
pub trait Translator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Translate every title or fail. A successful result must be aligned
    /// 1:1 with `titles`.
    async fn translate_batch(&self, titles: &[String]) -> Result<Vec<String>, TranslateError>;
}

/// The last provider of a chain: always answers, falling back to the
/// original title for anything it cannot translate.
#[async_trait]
pub trait FallbackTranslator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn translate_all(&self, titles: &[String]) -> Vec<String>;
}

/// Best-effort check for text already written in Chinese: any CJK unified
/// ideograph among the first few characters.
pub fn looks_chinese(s: &str) -> bool {
    s.chars()
        .take(DETECT_PREFIX_CHARS)
        .any(|ch| ('\u{4e00}'..='\u{9fff}').contains(&ch))
}

/// Result of a chain run, with the provider that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub titles: Vec<String>,
    /// `None` when no provider was consulted.
    pub provider: Option<&'static str>,
}

pub struct TranslationChain {
    providers: Vec<Box<dyn Translator>>,
    fallback: Box<dyn FallbackTranslator>,
}

impl TranslationChain {
    pub fn new(providers: Vec<Box<dyn Translator>>, fallback: Box<dyn FallbackTranslator>) -> Self {
        Self { providers, fallback }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers
            .iter()
            .map(|p| p.name())
            .chain(std::iter::once(self.fallback.name()))
            .collect()
    }

    /// Translated titles, aligned with the input.
    pub async fn translate(&self, titles: &[String]) -> Vec<String> {
        self.run(titles).await.titles
    }

    pub async fn run(&self, titles: &[String]) -> Translation {
        if titles.is_empty() {
            return Translation {
                titles: Vec::new(),
                provider: None,
            };
        }

        if titles.iter().all(|t| looks_chinese(t)) {
            debug!("All {} titles already look Chinese, skipping translation", titles.len());
            return Translation {
                titles: titles.to_vec(),
                provider: None,
            };
        }

        for provider in &self.providers {
            match provider.translate_batch(titles).await {
                Ok(out) if out.len() == titles.len() => {
                    info!("Translated {} titles with {}", out.len(), provider.name());
                    return Translation {
                        titles: out,
                        provider: Some(provider.name()),
                    };
                }
                Ok(out) => {
                    let e = TranslateError::LengthMismatch {
                        expected: titles.len(),
                        got: out.len(),
                    };
                    warn!("{} rejected: {}", provider.name(), e);
                }
                Err(TranslateError::Unavailable(what)) => {
                    debug!("Skipping {}: {} is not configured", provider.name(), what);
                }
                Err(e) => {
                    warn!("{} failed, trying next provider: {}", provider.name(), e);
                }
            }
        }

        let out = self.fallback.translate_all(titles).await;
        info!("Translated {} titles with {}", out.len(), self.fallback.name());
        Translation {
            titles: out,
            provider: Some(self.fallback.name()),
        }
    }
}

/// Turn a non-2xx response into [`TranslateError::Status`], keeping the body
/// for the log.
pub(crate) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TranslateError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TranslateError::Status {
        status: status.as_u16(),
        body,
    })
}

/// Sleep between per-title requests.
pub(crate) async fn pace(interval: std::time::Duration) {
    if !interval.is_zero() {
        tokio::time::sleep(interval).await;
    }
}
