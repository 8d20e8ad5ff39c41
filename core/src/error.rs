//! Error types for the YOURLS API client.
//!
//! # Design
//! Configuration problems are detected before any network I/O and carry a
//! human-readable reason. Transport failures keep the underlying error as
//! their source so callers can downcast to the transport's own type. A
//! non-2xx reply with a body lands in `Http` with the raw status and body.

use thiserror::Error;

/// Errors returned by `ShortenerClient` and the host hooks.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid settings: no authentication mode, an unknown
    /// format/filter/method, or an empty endpoint url.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request never produced a response (connect, timeout, I/O).
    #[error("transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The response body does not match the declared response format.
    #[error("decode error: {0}")]
    Decode(String),

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The before-output hook was asked to shorten a page without a title.
    #[error("no page title provided, cannot shorten {0}")]
    MissingPageTitle(String),
}

impl ApiError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        ApiError::Configuration(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        ApiError::Decode(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, ApiError::Configuration(_))
    }
}
