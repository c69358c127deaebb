//! Configuration for newsbrief.
//!
//! Settings are read from `~/.config/newsbrief/config.toml` (or the path given
//! with `--config`); every section and field is optional. Environment
//! variables are applied on top, and credentials are only ever taken from the
//! environment.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::fetcher::http_fetcher;
use crate::notify::serverchan;
use crate::translate::{deepl, mymemory, openai};

pub const DEFAULT_TITLE: &str = "今日热点简报｜全球 + 国内";
pub const DEFAULT_TOP_K: usize = 6;
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (NewsPushBot/2.0; +https://github.com/)";

pub const DEFAULT_GLOBAL_FEEDS: &[&str] = &[
    "http://feeds.bbci.co.uk/news/world/rss.xml",
    "http://rss.cnn.com/rss/edition_world.rss",
    "https://feeds.reuters.com/reuters/worldNews",
];

pub const DEFAULT_DOMESTIC_FEEDS: &[&str] = &[
    "http://www.news.cn/rss/politics.xml",
    "https://news.cctv.com/data/rss/newsChina.xml",
    "https://www.thepaper.cn/rss.jsp?nodeid=25434",
];

/// Main configuration struct.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Digest heading, also used as the push title.
    pub title: String,
    pub top_k_per_source: usize,
    pub user_agent: String,
    pub feeds: FeedsConfig,
    pub fetch: FetchConfig,
    pub translate: TranslateConfig,
    pub notify: NotifyConfig,
    /// Never read from the file.
    #[serde(skip)]
    pub credentials: Credentials,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            top_k_per_source: DEFAULT_TOP_K,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            feeds: FeedsConfig::default(),
            fetch: FetchConfig::default(),
            translate: TranslateConfig::default(),
            notify: NotifyConfig::default(),
            credentials: Credentials::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    pub global: Vec<String>,
    pub domestic: Vec<String>,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            global: DEFAULT_GLOBAL_FEEDS.iter().map(|s| s.to_string()).collect(),
            domestic: DEFAULT_DOMESTIC_FEEDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Extra attempts after the first one.
    pub retries: u32,
    pub timeout_secs: u64,
    pub between_sources_ms: u64,
    pub backoff_base_ms: u64,
    pub backoff_step_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            retries: 2,
            timeout_secs: http_fetcher::DEFAULT_TIMEOUT.as_secs(),
            between_sources_ms: 600,
            backoff_base_ms: 1200,
            backoff_step_ms: 300,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn between_sources(&self) -> Duration {
        Duration::from_millis(self.between_sources_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    pub openai_url: String,
    pub openai_model: String,
    pub openai_timeout_secs: u64,
    pub deepl_interval_ms: u64,
    pub mymemory_url: String,
    pub mymemory_langpair: String,
    pub mymemory_interval_ms: u64,
    /// Per-request timeout for DeepL and MyMemory.
    pub request_timeout_secs: u64,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            openai_url: openai::DEFAULT_URL.to_string(),
            openai_model: openai::DEFAULT_MODEL.to_string(),
            openai_timeout_secs: openai::DEFAULT_TIMEOUT.as_secs(),
            deepl_interval_ms: deepl::DEFAULT_INTERVAL.as_millis() as u64,
            mymemory_url: mymemory::DEFAULT_URL.to_string(),
            mymemory_langpair: mymemory::DEFAULT_LANGPAIR.to_string(),
            mymemory_interval_ms: mymemory::DEFAULT_INTERVAL.as_millis() as u64,
            request_timeout_secs: mymemory::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    pub serverchan_base_url: String,
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            serverchan_base_url: serverchan::DEFAULT_BASE_URL.to_string(),
            timeout_secs: serverchan::DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

/// API keys, filled from the environment only.
#[derive(Clone, Default, PartialEq)]
pub struct Credentials {
    pub serverchan_sendkey: Option<String>,
    pub openai_api_key: Option<String>,
    pub deepl_api_key: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| if v.is_some() { "<set>" } else { "<unset>" };
        f.debug_struct("Credentials")
            .field("serverchan_sendkey", &mask(&self.serverchan_sendkey))
            .field("openai_api_key", &mask(&self.openai_api_key))
            .field("deepl_api_key", &mask(&self.deepl_api_key))
            .finish()
    }
}

impl Config {
    /// Load configuration and apply the process environment.
    ///
    /// An explicit path must exist. Without one, the default path is used
    /// when present; otherwise built-in defaults apply.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_config_path() {
                Ok(p) if p.exists() => Self::from_file(&p)?,
                Ok(_) | Err(ConfigError::NoConfigDir) => Self::default(),
                Err(e) => return Err(e),
            },
        };
        config.apply_env(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/newsbrief/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("newsbrief").join("config.toml"))
    }

    /// Overlay environment variables. Blank values count as unset.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(value) = get("TOP_K_PER_SOURCE") {
            self.top_k_per_source = value.parse().map_err(|_| ConfigError::InvalidEnv {
                var: "TOP_K_PER_SOURCE",
                value: value.clone(),
            })?;
        }
        if let Some(ua) = get("HTTP_UA") {
            self.user_agent = ua;
        }
        if let Some(url) = get("OPENAI_BASE_URL") {
            self.translate.openai_url = url;
        }
        if let Some(model) = get("OPENAI_MODEL") {
            self.translate.openai_model = model;
        }

        self.credentials = Credentials {
            serverchan_sendkey: get("SERVERCHAN_SENDKEY"),
            openai_api_key: get("OPENAI_API_KEY"),
            deepl_api_key: get("DEEPL_API_KEY"),
        };
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidEnv { var: &'static str, value: String },
}
