//! Error types for fetch operations.

use std::io;
use thiserror::Error;
use url::Url;

/// Errors that can occur while fetching a resource.
#[derive(Error, Debug)]
pub enum FetchError {
    /// The input string could not be parsed as a URL. No connection is
    /// opened and no attempt is consumed.
    #[error("malformed URL {url:?}")]
    MalformedUrl {
        /// The string that failed to parse.
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Every attempt ended in a read or connect timeout.
    #[error("too many timeouts while fetching {url} ({attempts} attempts)")]
    ExhaustedRetries {
        /// The URL that kept timing out.
        url: Url,
        /// How many attempts were made before giving up.
        attempts: u32,
    },

    /// HTTP request error, including non-success status codes. Never retried.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// I/O error from the sink or the decompression layer. Never retried.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A configured header name or value is not valid on the wire.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// The fetch configuration itself is unusable.
    #[error("invalid fetch configuration: {0}")]
    Config(String),
}
