use thiserror::Error;

use crate::domain::BuildError;

#[derive(Error, Debug)]
pub enum ChanfeedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid line: {0}")]
    Build(#[from] BuildError),

    #[error("Connection engine is gone")]
    EngineGone,

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, ChanfeedError>;
