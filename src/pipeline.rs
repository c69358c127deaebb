//! One end-to-end run: collect both categories, translate the global one,
//! render and deliver.

use std::fmt::Display;
use std::time::Duration;

use chrono::{DateTime, Local, TimeZone};
use tracing::{info, warn};

use crate::app::Result;
use crate::config::Config;
use crate::dedup::dedup;
use crate::domain::{Category, NewsItem};
use crate::fetcher::SourceFetcher;
use crate::notify::Notifier;
use crate::render::render;
use crate::translate::TranslationChain;

/// Run parameters taken from [`Config`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub title: String,
    pub global_feeds: Vec<String>,
    pub domestic_feeds: Vec<String>,
    pub top_k_per_source: usize,
    pub between_sources: Duration,
}

impl PipelineSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            title: config.title.clone(),
            global_feeds: config.feeds.global.clone(),
            domestic_feeds: config.feeds.domestic.clone(),
            top_k_per_source: config.top_k_per_source,
            between_sources: config.fetch.between_sources(),
        }
    }

    pub fn feeds(&self, category: Category) -> &[String] {
        match category {
            Category::Global => &self.global_feeds,
            Category::Domestic => &self.domestic_feeds,
        }
    }
}

/// Deduplicated items of one category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collected {
    pub items: Vec<NewsItem>,
    pub failed_sources: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub global_items: usize,
    pub domestic_items: usize,
    pub failed_sources: usize,
    /// Translation provider that answered, if any was consulted.
    pub provider: Option<&'static str>,
}

/// A rendered digest, ready to send.
#[derive(Debug, Clone)]
pub struct Digest {
    pub title: String,
    pub markdown: String,
    pub global: Vec<NewsItem>,
    pub global_translated: Vec<String>,
    pub domestic: Vec<NewsItem>,
    pub summary: RunSummary,
}

pub struct Pipeline {
    sources: SourceFetcher,
    translator: TranslationChain,
    notifier: Box<dyn Notifier>,
    settings: PipelineSettings,
}

impl Pipeline {
    pub fn new(
        sources: SourceFetcher,
        translator: TranslationChain,
        notifier: Box<dyn Notifier>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            sources,
            translator,
            notifier,
            settings,
        }
    }

    pub fn sources(&self) -> &SourceFetcher {
        &self.sources
    }

    pub fn translator(&self) -> &TranslationChain {
        &self.translator
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    /// Fetch every source of `category` in order, then deduplicate.
    pub async fn collect(&self, category: Category) -> Collected {
        let feeds = self.settings.feeds(category);
        info!("Collecting {} news from {} sources", category, feeds.len());

        let mut items = Vec::new();
        let mut failed_sources = 0;
        for url in feeds {
            let outcome = self.sources.fetch_source(url, self.settings.top_k_per_source).await;
            if outcome.is_failed() {
                failed_sources += 1;
            }
            items.extend(outcome.into_items());

            if !self.settings.between_sources.is_zero() {
                tokio::time::sleep(self.settings.between_sources).await;
            }
        }

        let items = dedup(items);
        info!("{} {} items after dedup", items.len(), category);
        Collected {
            items,
            failed_sources,
        }
    }

    /// Collect, translate and render, timestamped with local time.
    pub async fn build_digest(&self) -> Digest {
        self.build_digest_at(&Local::now()).await
    }

    pub async fn build_digest_at<Tz>(&self, now: &DateTime<Tz>) -> Digest
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let global = self.collect(Category::Global).await;
        let domestic = self.collect(Category::Domestic).await;

        let originals: Vec<String> = global.items.iter().map(|i| i.title.clone()).collect();
        let translation = self.translator.run(&originals).await;
        let (global_translated, provider) = if translation.titles.len() == originals.len() {
            (translation.titles, translation.provider)
        } else {
            warn!(
                "Translation returned {} titles for {} items, using originals",
                translation.titles.len(),
                originals.len()
            );
            (originals, None)
        };

        let markdown = render(
            &self.settings.title,
            &global.items,
            &global_translated,
            &domestic.items,
            now,
        );

        let summary = RunSummary {
            global_items: global.items.len(),
            domestic_items: domestic.items.len(),
            failed_sources: global.failed_sources + domestic.failed_sources,
            provider,
        };

        Digest {
            title: self.settings.title.clone(),
            markdown,
            global: global.items,
            global_translated,
            domestic: domestic.items,
            summary,
        }
    }

    pub async fn deliver(&self, digest: &Digest) -> Result<String> {
        let receipt = self.notifier.send(&digest.title, &digest.markdown).await?;
        Ok(receipt)
    }

    /// Full cycle. Only delivery failures are errors.
    pub async fn run(&self) -> Result<String> {
        let digest = self.build_digest().await;
        log_summary(&digest.summary);
        self.deliver(&digest).await
    }
}

pub fn log_summary(summary: &RunSummary) {
    info!(
        "Run summary: {} global, {} domestic, {} failed sources, translation by {}",
        summary.global_items,
        summary.domestic_items,
        summary.failed_sources,
        summary.provider.unwrap_or("none")
    );
}
