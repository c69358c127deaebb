use thiserror::Error;

use crate::config::ConfigError;
use crate::notify::NotifyError;

#[derive(Error, Debug)]
pub enum NewsbriefError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Delivery error: {0}")]
    Notify(#[from] NotifyError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, NewsbriefError>;
