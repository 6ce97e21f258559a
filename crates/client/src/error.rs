//! Error taxonomy for the client SDK.

use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur when interacting with the ordering API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed. Propagated unchanged to the caller.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server-reported domain error, surfaced via the `message` field of the
    /// error body when present.
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Server-provided message, or the status reason as a fallback.
        message: String,
    },

    /// Authorization failed and the refresh-and-retry cycle was exhausted.
    /// Both tokens have been cleared; the session is over.
    #[error("authorization failed and could not be recovered; sign in again")]
    Unauthorized,

    /// Input rejected before any network dispatch.
    #[error("validation error: {0}")]
    Validation(String),

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Durable token storage failed.
    #[error("token store error: {0}")]
    Store(#[from] StoreError),
}

impl ApiError {
    /// True if this error ended the session (terminal authorization failure).
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }
}
