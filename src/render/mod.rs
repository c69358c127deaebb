//! Markdown layout of the digest.
//!
//! The output is kept to plain headings, numbered lines and hard line breaks
//! (two trailing spaces) so chat clients that fold long messages still show
//! the structure.

use std::fmt::Display;

use chrono::{DateTime, TimeZone};
use html_escape::encode_quoted_attribute;

use crate::domain::NewsItem;

pub const GLOBAL_HEADING: &str = "### 🌍 全球热点（已译）";
pub const DOMESTIC_HEADING: &str = "### 🇨🇳 国内热点";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Escape `&`, `<`, `>`, `"` and `'` in feed-supplied text.
pub fn escape(text: &str) -> String {
    encode_quoted_attribute(text).into_owned()
}

/// Render the digest. `global_translated` must be aligned with
/// `global_items`.
pub fn render<Tz>(
    title: &str,
    global_items: &[NewsItem],
    global_translated: &[String],
    domestic_items: &[NewsItem],
    timestamp: &DateTime<Tz>,
) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    debug_assert_eq!(global_items.len(), global_translated.len());

    let mut lines = Vec::with_capacity(global_items.len() + domestic_items.len() + 4);
    lines.push(format!(
        "**{}**  \n更新：{}\n",
        title,
        timestamp.format(TIMESTAMP_FORMAT)
    ));

    lines.push(GLOBAL_HEADING.to_string());
    for (i, (item, zh)) in global_items.iter().zip(global_translated).enumerate() {
        let original = escape(&item.title);
        let zh = escape(zh);
        if item.has_link() {
            lines.push(format!(
                "{}. {}  \n    *{}*  \n    [{}]({})",
                i + 1,
                zh,
                original,
                item.source_host,
                item.link
            ));
        } else {
            lines.push(format!("{}. {}  \n    *{}*", i + 1, zh, original));
        }
    }
    lines.push(String::new());

    lines.push(DOMESTIC_HEADING.to_string());
    for (i, item) in domestic_items.iter().enumerate() {
        let title = escape(&item.title);
        if item.has_link() {
            lines.push(format!(
                "{}. {}  \n    [{}]({})",
                i + 1,
                title,
                item.source_host,
                item.link
            ));
        } else {
            lines.push(format!("{}. {}", i + 1, title));
        }
    }

    lines.join("\n")
}
