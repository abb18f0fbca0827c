use thiserror::Error;

use crate::codec::Tag;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Format error: expected {expected} tag, found byte {found:#04x}")]
    TagMismatch { expected: Tag, found: u8 },

    #[error("invalid magic: {0:?}")]
    BadMagic(String),

    #[error("failed to allocate {bytes} bytes")]
    Alloc { bytes: usize },

    #[error("{0}")]
    Precondition(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP status {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("gave up after {limit} redirects fetching {url}")]
    TooManyRedirects { limit: u32, url: String },

    #[error("unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl From<reqwest::Error> for SplitError {
    fn from(e: reqwest::Error) -> Self {
        SplitError::Network(e.to_string())
    }
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, SplitError>;
