//! Durable storage for the session token pair.
//!
//! Both the Session Manager and the Request Gateway treat the store as the
//! single source of truth for "is a session active": tokens are re-read on
//! every use rather than cached in memory, so a logout performed by one code
//! path is immediately visible to the next outgoing request.

mod file;

pub use file::FileTokenStore;

use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when reading or writing the token store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying I/O failed.
    #[error("token store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored content could not be decoded.
    #[error("token store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),

    /// A lock on the in-memory store was poisoned.
    #[error("token store lock poisoned")]
    Poisoned,
}

/// An access/refresh token pair as issued by the auth endpoints.
///
/// Serialized with exactly the keys `access_token` / `refresh_token`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer credential attached to API calls.
    pub access_token: String,
    /// Longer-lived credential exchanged for a new pair.
    pub refresh_token: String,
}

impl TokenPair {
    /// Create a token pair.
    #[must_use]
    pub const fn new(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
        }
    }
}

/// Durable storage for the token pair.
///
/// Implementations must be cheap to read: callers re-read on every request.
pub trait TokenStore: Send + Sync {
    /// Load the stored token pair, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn load(&self) -> Result<Option<TokenPair>, StoreError>;

    /// Persist the token pair, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn save(&self, tokens: &TokenPair) -> Result<(), StoreError>;

    /// Remove any stored tokens.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn clear(&self) -> Result<(), StoreError>;
}

/// In-memory token store.
///
/// Used by tests and by embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryTokenStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<TokenPair>, StoreError> {
        let guard = self.tokens.read().map_err(|_| StoreError::Poisoned)?;
        Ok(guard.clone())
    }

    fn save(&self, tokens: &TokenPair) -> Result<(), StoreError> {
        let mut guard = self.tokens.write().map_err(|_| StoreError::Poisoned)?;
        *guard = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self.tokens.write().map_err(|_| StoreError::Poisoned)?;
        *guard = None;
        Ok(())
    }
}
