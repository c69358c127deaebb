//! Turning a downloaded feed body into [`NewsItem`](crate::domain::NewsItem)s.
//!
//! Two strategies are available. [`FeedRsStrategy`] understands RSS 0.9x/1.0/2.0,
//! Atom and JSON Feed and is tried first; [`XmlScanStrategy`] walks the raw XML
//! looking for `item` (then `entry`) elements and copes with documents the
//! format-aware parser rejects.

mod feed;
mod xml_scan;

pub use feed::FeedRsStrategy;
pub use xml_scan::XmlScanStrategy;

use crate::app::Result;
use crate::domain::NewsItem;

/// One way of extracting items from a feed body.
pub trait ParseStrategy {
    fn name(&self) -> &'static str;

    /// Parse at most `max_items` items. Missing fields must not abort the
    /// remaining entries.
    fn parse(&self, body: &[u8], max_items: usize) -> Result<Vec<NewsItem>>;
}
