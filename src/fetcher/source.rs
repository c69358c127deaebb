use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::app::Result;
use crate::domain::NewsItem;
use crate::fetcher::Fetcher;
use crate::normalizer::{FeedRsStrategy, ParseStrategy, XmlScanStrategy};

pub const DEFAULT_RETRIES: u32 = 2;

/// How often a source is retried and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub backoff_base: Duration,
    /// Added to the base once per previous failed attempt.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            backoff_base: Duration::from_millis(1200),
            backoff_step: Duration::from_millis(300),
        }
    }
}

impl RetryPolicy {
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    /// Delay after the failed attempt with the given 0-based index.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.backoff_base + self.backoff_step * attempt
    }

    /// No waiting at all; used by tests and one-off CLI fetches.
    pub fn immediate(retries: u32) -> Self {
        Self {
            retries,
            backoff_base: Duration::ZERO,
            backoff_step: Duration::ZERO,
        }
    }
}

/// What became of one source after the whole retry budget.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Fetched(Vec<NewsItem>),
    Failed { url: String, attempts: u32 },
}

impl SourceOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, SourceOutcome::Failed { .. })
    }

    /// The fetched items, or a single sentinel item for a failed source.
    pub fn into_items(self) -> Vec<NewsItem> {
        match self {
            SourceOutcome::Fetched(items) => items,
            SourceOutcome::Failed { url, .. } => vec![NewsItem::fetch_failed(&url)],
        }
    }
}

/// Fetches one feed, parses it with a primary and a secondary strategy and
/// retries the pair when neither produces anything.
pub struct SourceFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    primary: Box<dyn ParseStrategy + Send + Sync>,
    secondary: Box<dyn ParseStrategy + Send + Sync>,
    retry: RetryPolicy,
}

impl SourceFetcher {
    pub fn new(fetcher: Arc<dyn Fetcher + Send + Sync>, retry: RetryPolicy) -> Self {
        Self::with_strategies(
            fetcher,
            Box::new(FeedRsStrategy::new()),
            Box::new(XmlScanStrategy::new()),
            retry,
        )
    }

    pub fn with_strategies(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        primary: Box<dyn ParseStrategy + Send + Sync>,
        secondary: Box<dyn ParseStrategy + Send + Sync>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            fetcher,
            primary,
            secondary,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Items for `url`, or one sentinel item if the source never produced any.
    pub async fn fetch(&self, url: &str, max_items: usize) -> Vec<NewsItem> {
        self.fetch_source(url, max_items).await.into_items()
    }

    pub async fn fetch_source(&self, url: &str, max_items: usize) -> SourceOutcome {
        let attempts = self.retry.attempts();

        for attempt in 0..attempts {
            let items = match self.attempt(url, max_items).await {
                Ok(items) => items,
                Err(e) => {
                    warn!("Fetching {} failed (attempt {}/{}): {}", url, attempt + 1, attempts, e);
                    Vec::new()
                }
            };

            if !items.is_empty() {
                info!("Fetched {} items from {}", items.len(), url);
                return SourceOutcome::Fetched(items);
            }

            if attempt + 1 < attempts {
                let delay = self.retry.backoff(attempt);
                debug!("No items from {}, retrying in {:?}", url, delay);
                tokio::time::sleep(delay).await;
            }
        }

        warn!("Giving up on {} after {} attempts", url, attempts);
        SourceOutcome::Failed {
            url: url.to_string(),
            attempts,
        }
    }

    /// One download followed by primary, then (only if needed) secondary parsing.
    async fn attempt(&self, url: &str, max_items: usize) -> Result<Vec<NewsItem>> {
        let body = self.fetcher.fetch(url).await?;

        match self.primary.parse(&body, max_items) {
            Ok(items) if !items.is_empty() => return Ok(items),
            Ok(_) => debug!("{} found no entries in {}", self.primary.name(), url),
            Err(e) => debug!("{} could not parse {}: {}", self.primary.name(), url, e),
        }

        let items = self.secondary.parse(&body, max_items)?;
        if !items.is_empty() {
            debug!("{} recovered {} entries from {}", self.secondary.name(), items.len(), url);
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::app::NewsbriefError;

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title>
<item><title>One</title><link>https://bbc.co.uk/1</link></item>
<item><title>Two</title><link>https://bbc.co.uk/2</link></item>
</channel></rss>"#;

    struct StaticFetcher {
        bodies: HashMap<String, String>,
        calls: AtomicUsize,
    }

    impl StaticFetcher {
        fn new(pairs: &[(&str, &str)]) -> Self {
            Self {
                bodies: pairs.iter().map(|(u, b)| (u.to_string(), b.to_string())).collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl Fetcher for StaticFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.bodies
                .get(url)
                .map(|b| b.clone().into_bytes())
                .ok_or_else(|| NewsbriefError::Other(format!("unreachable: {}", url)))
        }
    }

    /// Wraps a strategy and counts invocations.
    struct Counting<S> {
        inner: S,
        calls: Arc<AtomicUsize>,
    }

    impl<S: ParseStrategy> ParseStrategy for Counting<S> {
        fn name(&self) -> &'static str {
            self.inner.name()
        }

        fn parse(&self, body: &[u8], max_items: usize) -> Result<Vec<NewsItem>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.parse(body, max_items)
        }
    }

    struct Nothing;

    impl ParseStrategy for Nothing {
        fn name(&self) -> &'static str {
            "nothing"
        }

        fn parse(&self, _body: &[u8], _max_items: usize) -> Result<Vec<NewsItem>> {
            Ok(Vec::new())
        }
    }

    fn counting_fetcher(
        fetcher: Arc<StaticFetcher>,
        primary: impl ParseStrategy + Send + Sync + 'static,
        retries: u32,
    ) -> (SourceFetcher, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let primary_calls = Arc::new(AtomicUsize::new(0));
        let secondary_calls = Arc::new(AtomicUsize::new(0));
        let source = SourceFetcher::with_strategies(
            fetcher,
            Box::new(Counting {
                inner: primary,
                calls: primary_calls.clone(),
            }),
            Box::new(Counting {
                inner: XmlScanStrategy::new(),
                calls: secondary_calls.clone(),
            }),
            RetryPolicy::immediate(retries),
        );
        (source, primary_calls, secondary_calls)
    }

    #[test]
    fn test_backoff_grows_per_attempt() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.attempts(), 3);
        assert_eq!(policy.backoff(0), Duration::from_millis(1200));
        assert_eq!(policy.backoff(1), Duration::from_millis(1500));
        assert_eq!(policy.backoff(2), Duration::from_millis(1800));
    }

    #[tokio::test]
    async fn test_primary_success_skips_secondary() {
        let fetcher = Arc::new(StaticFetcher::new(&[("https://feed/a", RSS)]));
        let (source, primary, secondary) = counting_fetcher(fetcher.clone(), FeedRsStrategy::new(), 2);

        let items = source.fetch("https://feed/a", 6).await;

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "One");
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.load(Ordering::SeqCst), 0);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_secondary_used_when_primary_empty() {
        let fetcher = Arc::new(StaticFetcher::new(&[("https://feed/a", RSS)]));
        let (source, primary, secondary) = counting_fetcher(fetcher, Nothing, 2);

        let items = source.fetch("https://feed/a", 1).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "One");
        assert_eq!(primary.load(Ordering::SeqCst), 1);
        assert_eq!(secondary.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_secondary_used_when_primary_errors() {
        // Not a feed root, so feed-rs rejects it; the scanner still finds the item.
        let odd = "<export><item><title>Kept</title><link>https://x.com/1</link></item></export>";
        let fetcher = Arc::new(StaticFetcher::new(&[("https://feed/a", odd)]));
        let (source, _, secondary) = counting_fetcher(fetcher, FeedRsStrategy::new(), 0);

        let outcome = source.fetch_source("https://feed/a", 6).await;

        assert_eq!(secondary.load(Ordering::SeqCst), 1);
        match outcome {
            SourceOutcome::Fetched(items) => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].title, "Kept");
            }
            other => panic!("expected items, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_exhausted_retries_yield_one_sentinel() {
        let fetcher = Arc::new(StaticFetcher::new(&[]));
        let (source, primary, _) = counting_fetcher(fetcher.clone(), FeedRsStrategy::new(), 2);

        let items = source.fetch("https://down.example/rss", 6).await;

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].source_host, "error");
        assert!(items[0].title.contains("https://down.example/rss"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
        // Download failures never reach the parsers.
        assert_eq!(primary.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_documents_are_retried() {
        let empty = r#"<rss version="2.0"><channel><title>t</title></channel></rss>"#;
        let fetcher = Arc::new(StaticFetcher::new(&[("https://feed/empty", empty)]));
        let (source, primary, secondary) = counting_fetcher(fetcher, FeedRsStrategy::new(), 1);

        let outcome = source.fetch_source("https://feed/empty", 6).await;

        assert_eq!(
            outcome,
            SourceOutcome::Failed {
                url: "https://feed/empty".into(),
                attempts: 2
            }
        );
        assert_eq!(primary.load(Ordering::SeqCst), 2);
        assert_eq!(secondary.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_zero_max_items_fails_soft() {
        let fetcher = Arc::new(StaticFetcher::new(&[("https://feed/a", RSS)]));
        let (source, _, _) = counting_fetcher(fetcher, FeedRsStrategy::new(), 0);

        let outcome = source.fetch_source("https://feed/a", 0).await;
        assert!(outcome.is_failed());
        assert_eq!(outcome.into_items().len(), 1);
    }
}
