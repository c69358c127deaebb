use html_escape::decode_html_entities;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::app::Result;
use crate::domain::NewsItem;
use crate::normalizer::ParseStrategy;

/// Schema-agnostic fallback: scan the XML tree for `item` elements, then
/// for `entry` elements if there were none.
///
/// Malformed documents keep whatever was collected before the error.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlScanStrategy;

impl XmlScanStrategy {
    pub fn new() -> Self {
        Self
    }
}

impl ParseStrategy for XmlScanStrategy {
    fn name(&self) -> &'static str {
        "xml-scan"
    }

    fn parse(&self, body: &[u8], max_items: usize) -> Result<Vec<NewsItem>> {
        if max_items == 0 {
            return Ok(Vec::new());
        }

        let items = scan(body, b"item", max_items);
        if !items.is_empty() {
            return Ok(items);
        }
        Ok(scan(body, b"entry", max_items))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Link,
    Published,
}

impl Field {
    fn from_local_name(name: &[u8]) -> Option<Self> {
        match name {
            b"title" => Some(Field::Title),
            b"link" => Some(Field::Link),
            b"pubDate" | b"updated" | b"published" => Some(Field::Published),
            _ => None,
        }
    }
}

#[derive(Default)]
struct EntryBuilder {
    title: String,
    link: String,
    published: String,
}

impl EntryBuilder {
    fn slot(&mut self, field: Field) -> &mut String {
        match field {
            Field::Title => &mut self.title,
            Field::Link => &mut self.link,
            Field::Published => &mut self.published,
        }
    }

    fn build(self) -> NewsItem {
        let title = decode_html_entities(self.title.trim()).trim().to_string();
        NewsItem::new(title, self.link.trim(), self.published.trim())
    }
}

/// `href` attribute of an Atom-style `<link/>`.
fn href_of(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.local_name().as_ref() == b"href")
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn scan(body: &[u8], container: &[u8], max_items: usize) -> Vec<NewsItem> {
    let mut reader = Reader::from_reader(body);

    let mut items = Vec::new();
    let mut buf = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    // Field being filled and the depth of the element that opened it. Inline
    // children (`<b>`, `<i>`, ...) keep appending to it until that element ends.
    let mut field: Option<(Field, usize)> = None;
    let mut depth = 0usize;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name();
                if name.as_ref() == container {
                    current = Some(EntryBuilder::default());
                    field = None;
                    depth = 0;
                } else if let Some(entry) = current.as_mut() {
                    depth += 1;
                    if field.is_none() {
                        // Nested elements with a known name (media:title, ...) never
                        // overwrite a field that is already filled.
                        field = Field::from_local_name(name.as_ref())
                            .filter(|f| entry.slot(*f).is_empty())
                            .map(|f| (f, depth));
                        if let Some((Field::Link, _)) = field {
                            if let Some(href) = href_of(&e) {
                                *entry.slot(Field::Link) = href;
                                field = None;
                            }
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    if e.local_name().as_ref() == b"link" && entry.link.is_empty() {
                        if let Some(href) = href_of(&e) {
                            entry.link = href;
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == container {
                    field = None;
                    if let Some(entry) = current.take() {
                        items.push(entry.build());
                        if items.len() >= max_items {
                            break;
                        }
                    }
                } else if current.is_some() {
                    if matches!(field, Some((_, opened_at)) if opened_at == depth) {
                        field = None;
                    }
                    depth = depth.saturating_sub(1);
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(entry), Some((f, _))) = (current.as_mut(), field) {
                    let text = match e.unescape() {
                        Ok(text) => text.into_owned(),
                        // Undeclared HTML entities such as &nbsp; are common in feeds.
                        Err(_) => decode_html_entities(&String::from_utf8_lossy(&e)).into_owned(),
                    };
                    entry.slot(f).push_str(&text);
                }
            }
            Ok(Event::CData(e)) => {
                if let (Some(entry), Some((f, _))) = (current.as_mut(), field) {
                    entry.slot(f).push_str(&String::from_utf8_lossy(&e));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(
                    "XML scan stopped at position {}: {}",
                    reader.buffer_position(),
                    e
                );
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>CNN.com - World</title>
    <item>
      <title><![CDATA[Storm <b>nears</b> coast]]></title>
      <link>https://edition.cnn.com/1</link>
      <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
      <media:content><media:title>Thumbnail caption</media:title></media:content>
    </item>
    <item>
      <title>Fish &amp; chips&nbsp;tax</title>
    </item>
    <item>
      <link>https://edition.cnn.com/3</link>
    </item>
  </channel>
</rss>"#;

    const ATOM_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom</title>
  <entry>
    <title>First entry</title>
    <link rel="alternate" href="https://example.org/first"/>
    <updated>2024-01-01T00:00:00Z</updated>
  </entry>
  <entry>
    <title>Second entry</title>
  </entry>
</feed>"#;

    #[test]
    fn test_scan_rss_items() {
        let items = XmlScanStrategy::new().parse(RSS_SAMPLE.as_bytes(), 10).unwrap();

        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Storm <b>nears</b> coast");
        assert_eq!(items[0].link, "https://edition.cnn.com/1");
        assert_eq!(items[0].published, "Tue, 02 Jan 2024 10:00:00 GMT");
        assert_eq!(items[0].source_host, "edition.cnn.com");
    }

    #[test]
    fn test_scan_tolerates_missing_fields() {
        let items = XmlScanStrategy::new().parse(RSS_SAMPLE.as_bytes(), 10).unwrap();

        assert!(items[1].title.starts_with("Fish & chips"));
        assert_eq!(items[1].link, "");
        assert_eq!(items[1].source_host, "source");
        assert_eq!(items[2].title, "");
        assert_eq!(items[2].link, "https://edition.cnn.com/3");
    }

    #[test]
    fn test_scan_falls_back_to_atom_entries() {
        let items = XmlScanStrategy::new().parse(ATOM_SAMPLE.as_bytes(), 10).unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "First entry");
        assert_eq!(items[0].link, "https://example.org/first");
        assert_eq!(items[0].published, "2024-01-01T00:00:00Z");
        assert_eq!(items[1].link, "");
    }

    #[test]
    fn test_scan_caps_at_max_items() {
        let items = XmlScanStrategy::new().parse(RSS_SAMPLE.as_bytes(), 1).unwrap();
        assert_eq!(items.len(), 1);

        let items = XmlScanStrategy::new().parse(RSS_SAMPLE.as_bytes(), 0).unwrap();
        assert!(items.is_empty());
    }

    #[test]
    fn test_scan_keeps_items_before_malformed_tail() {
        let body = "<rss><channel>\
            <item><title>Complete</title><link>https://a.com/1</link></item>\
            <item><title>Broken</title></wrong></channel>";

        let items = XmlScanStrategy::new().parse(body.as_bytes(), 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Complete");
    }

    #[test]
    fn test_scan_keeps_text_around_inline_markup() {
        let body = "<rss><channel><item>\
            <title>Foo <b>bar</b> baz</title>\
            <link>https://a.com/1</link>\
            </item></channel></rss>";

        let items = XmlScanStrategy::new().parse(body.as_bytes(), 10).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Foo bar baz");
        assert_eq!(items[0].link, "https://a.com/1");
    }

    #[test]
    fn test_scan_non_feed_yields_nothing() {
        let items = XmlScanStrategy::new()
            .parse(b"<html><body><p>hello</p></body></html>", 5)
            .unwrap();
        assert!(items.is_empty());
    }
}
