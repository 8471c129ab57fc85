use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HashwardError {
    #[error("failed to decode image: {0}")]
    Decode(String),

    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    #[error("unsupported image extension: {0}")]
    UnsupportedExtension(String),

    #[error("reference store unavailable at {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HashwardError>;
