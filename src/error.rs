use thiserror::Error;

/// Errors surfaced by the library.
///
/// Filenames that do not match a title pattern and names that cannot be
/// re-decoded are not errors: both fall back to the raw text.
#[derive(Debug, Error)]
pub enum FinderError {
    #[error("config error: {0}")]
    Config(String),

    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("malformed response: {0}")]
    Json(#[from] serde_json::Error),

    #[error("no results for {0}")]
    EmptyResult(String),

    #[error("metadata lookup unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, FinderError>;
