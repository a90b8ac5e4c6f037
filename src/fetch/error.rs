//! Feed fetch error types.

/// Errors that can occur while fetching a feed.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("invalid feed URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The endpoint answered with a non-2xx status
    #[error("HTTP error: {status} {status_text}")]
    Http { status: u16, status_text: String },

    /// DNS, connection, timeout or body transfer failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The body was not valid JSON
    #[error("feed body is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}
