//! Collapse repeated headlines gathered from several feeds of one category.

use std::collections::HashSet;

use crate::domain::NewsItem;

/// Drop items whose `(trimmed title, source_host)` was already seen, and items
/// with a blank title. The first occurrence wins and order is preserved.
pub fn dedup(items: Vec<NewsItem>) -> Vec<NewsItem> {
    let mut seen: HashSet<(String, String)> = HashSet::with_capacity(items.len());
    let mut out = Vec::with_capacity(items.len());

    for item in items {
        let title = item.title.trim();
        if title.is_empty() {
            continue;
        }
        if !seen.insert((title.to_string(), item.source_host.clone())) {
            continue;
        }
        out.push(item);
    }

    out
}
