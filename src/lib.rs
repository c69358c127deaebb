//! # newsbrief
//!
//! Builds a short daily digest of world and China headlines, translates the
//! world headlines into Chinese and pushes the result to ServerChan.
//!
//! ## Architecture
//!
//! ```text
//! SourceFetcher → dedup → TranslationChain → render → Notifier
//! ```
//!
//! Every stage runs sequentially. Source failures become placeholder items
//! and translation failures fall through to the next provider; only delivery
//! can fail a run.
//!
//! ## Quick Start
//!
//! ```bash
//! # Print today's digest without sending it
//! newsbrief run --dry-run
//!
//! # Build and push (needs SERVERCHAN_SENDKEY)
//! newsbrief
//!
//! # Inspect a single feed
//! newsbrief fetch http://feeds.bbci.co.uk/news/world/rss.xml --limit 3
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the shared HTTP
/// client, the source fetcher, the translation chain and the notifier.
pub mod app;

/// Command-line interface using clap.
///
/// - `run [--dry-run]` - Build and push the digest (default)
/// - `fetch <url> [--limit N]` - Fetch one feed and list its items
/// - `translate <title>...` - Run the translation chain
pub mod cli;

/// TOML configuration with environment overrides.
pub mod config;

pub mod dedup;

/// Core domain models: [`NewsItem`](domain::NewsItem) and
/// [`Category`](domain::Category).
pub mod domain;

/// Feed download with retries.
///
/// - [`Fetcher`](fetcher::Fetcher): Async trait for downloading a feed body
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
/// - [`SourceFetcher`](fetcher::SourceFetcher): Parse strategies plus retry loop
pub mod fetcher;

/// Feed parsing.
///
/// A feed-rs strategy for well-formed RSS/Atom/JSON Feed and a quick-xml
/// scan for documents it rejects.
pub mod normalizer;

/// ServerChan delivery.
pub mod notify;

pub mod pipeline;

/// Markdown rendering of the digest.
pub mod render;

/// Headline translation: OpenAI, DeepL, then MyMemory.
pub mod translate;
