use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{NewsbriefError, Result};
use crate::domain::NewsItem;
use crate::normalizer::ParseStrategy;

/// Format-aware parsing through `feed-rs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedRsStrategy;

impl FeedRsStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ParseStrategy for FeedRsStrategy {
    fn name(&self) -> &'static str {
        "feed-rs"
    }

    fn parse(&self, body: &[u8], max_items: usize) -> Result<Vec<NewsItem>> {
        let feed = parser::parse(body).map_err(|e| NewsbriefError::FeedParse(e.to_string()))?;

        let items = feed
            .entries
            .into_iter()
            .take(max_items)
            .map(|entry| {
                let title = entry
                    .title
                    .map(|t| decode_html_entities(&t.content).trim().to_string())
                    .unwrap_or_default();
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.trim().to_string())
                    .unwrap_or_default();
                let published = entry
                    .published
                    .or(entry.updated)
                    .map(|dt| dt.to_rfc2822())
                    .unwrap_or_default();

                NewsItem::new(title, link, published)
            })
            .collect();

        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>BBC News - World</title>
    <item>
      <title>Quake hits region</title>
      <link>https://www.bbc.co.uk/news/world-1</link>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Markets &amp; trade</title>
      <link>https://www.bbc.co.uk/news/world-2</link>
    </item>
    <item>
      <link>https://www.bbc.co.uk/news/world-3</link>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Test Feed</title>
  <id>urn:feed</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Atom Entry 1</title>
    <link href="https://example.com/atom1"/>
    <id>atom-entry-1</id>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_rss() {
        let items = FeedRsStrategy::new().parse(RSS_SAMPLE.as_bytes(), 10).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Quake hits region");
        assert_eq!(items[0].link, "https://www.bbc.co.uk/news/world-1");
        assert_eq!(items[0].source_host, "www.bbc.co.uk");
        assert!(items[0].published.contains("2024"));
        assert_eq!(items[1].title, "Markets & trade");
        assert_eq!(items[1].published, "");
        // Missing title does not drop the entry here; dedup does that.
        assert_eq!(items[2].title, "");
    }

    #[test]
    fn test_published_is_rfc2822() {
        let items = FeedRsStrategy::new().parse(ATOM_SAMPLE.as_bytes(), 10).unwrap();

        let parsed = chrono::DateTime::parse_from_rfc2822(&items[0].published).unwrap();
        assert_eq!(parsed.to_rfc3339(), "2024-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_atom() {
        let items = FeedRsStrategy::new().parse(ATOM_SAMPLE.as_bytes(), 10).unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Atom Entry 1");
        assert_eq!(items[0].link, "https://example.com/atom1");
        assert_eq!(items[0].source_host, "example.com");
        assert!(!items[0].published.is_empty());
    }

    #[test]
    fn test_caps_at_max_items() {
        let items = FeedRsStrategy::new().parse(RSS_SAMPLE.as_bytes(), 2).unwrap();
        assert_eq!(items.len(), 2);

        let items = FeedRsStrategy::new().parse(RSS_SAMPLE.as_bytes(), 0).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(FeedRsStrategy::new().parse(b"<html><body>nope</body></html>", 5).is_err());
    }
}
