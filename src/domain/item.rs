use url::Url;

/// Host label used when an item has no usable link.
pub const UNKNOWN_HOST: &str = "source";

/// Host label that marks a failed-fetch sentinel item.
pub const ERROR_HOST: &str = "error";

/// A single headline taken from a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    /// Informational only, never used for ordering. Items from feed-rs carry
    /// the date it recognised, re-emitted as RFC 2822 (a date it could not
    /// read is left empty); items from the XML scan keep the element text.
    pub published: String,
    pub source_host: String,
}

impl NewsItem {
    /// Build an item, deriving `source_host` from the link.
    pub fn new(title: impl Into<String>, link: impl Into<String>, published: impl Into<String>) -> Self {
        let link = link.into();
        let source_host = host_of(&link);
        Self {
            title: title.into(),
            link,
            published: published.into(),
            source_host,
        }
    }

    /// Placeholder for a source that produced nothing after every retry.
    pub fn fetch_failed(source_url: &str) -> Self {
        Self {
            title: format!("【抓取失败】{}", source_url),
            link: String::new(),
            published: String::new(),
            source_host: ERROR_HOST.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.source_host == ERROR_HOST
    }

    pub fn has_link(&self) -> bool {
        !self.link.is_empty()
    }
}

/// Network location (`host[:port]`) of a link, or `"source"` when there is none.
pub fn host_of(link: &str) -> String {
    let link = link.trim();
    if link.is_empty() {
        return UNKNOWN_HOST.to_string();
    }

    match Url::parse(link) {
        Ok(url) => match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => UNKNOWN_HOST.to_string(),
        },
        Err(_) => UNKNOWN_HOST.to_string(),
    }
}
