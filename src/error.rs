//! Error types for sampleview
//!
//! This module provides the closed error taxonomy for the library:
//! - Transport-level failures with no response (`Network`)
//! - Authentication failures recoverable via token refresh (`Auth`)
//! - Server-side errors propagated untouched (`Server`)
//! - Form-displayable rejections carrying a `message` field (`Validation`)
//! - Terminal session expiry after a redirect has been issued (`SessionExpired`)
//!
//! All variants are produced at the transport boundary or by the request
//! pipeline; no component branches on the shape of a foreign error object.

use thiserror::Error;

use crate::pipeline::RedirectTarget;

/// Result type alias for sampleview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for sampleview
///
/// `Auth` is handled internally by the request pipeline (at most one
/// refresh-and-retry per call); everything else is returned to the caller
/// unmodified. `SessionExpired` is not a normal error: by the time it is
/// returned, the configured [`Navigator`](crate::pipeline::Navigator) has
/// already been asked to replace the client state.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure: the request never produced a response
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Authentication failure (401 or 422) on a protected call
    #[error("authentication failed with status {status}")]
    Auth {
        /// The HTTP status that signalled the failure (401 or 422)
        status: u16,
    },

    /// Non-2xx response that is neither an auth failure nor a form rejection
    #[error("server error {status}: {body}")]
    Server {
        /// The HTTP status code
        status: u16,
        /// The raw response body, useful for diagnostics
        body: String,
    },

    /// 4xx rejection carrying a `message` field, intended for form display
    #[error("{message}")]
    Validation {
        /// The HTTP status code
        status: u16,
        /// Human-readable message from the server
        message: String,
    },

    /// Unrecoverable auth failure; the navigator has already been invoked
    #[error("session expired, redirected to {redirect}")]
    SessionExpired {
        /// Where the embedding application was told to navigate
        redirect: RedirectTarget,
    },

    /// Credential store I/O failure
    #[error("credential store error: {0}")]
    Store(#[from] std::io::Error),

    /// Response body did not match the expected wire shape
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration (e.g. an unusable base URL)
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable description of the invalid setting
        message: String,
    },
}

impl Error {
    /// True for the statuses the pipeline may recover from via refresh.
    pub fn is_auth_failure(&self) -> bool {
        matches!(self, Error::Auth { .. })
    }
}
