//! Error types for store, registry and codec operations.
//!
//! Engine implementations report failures with `anyhow`; the store folds
//! those into boolean write results and absent reads. Only failures a caller
//! can act on surface through [`Error`].

use crate::codec::CodecError;

/// Result type for varddb operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the registry and typed store operations.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A store was requested before [`Registry::initialize`](crate::Registry::initialize).
    #[error("registry not initialized: call initialize() before requesting a store")]
    NotInitialized,

    /// Stored data could not be decoded as the requested kind.
    #[error("failed to decode '{key}': {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// A value could not be turned into its stored representation.
    #[error("failed to encode '{key}': {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Engine failure that has no boolean/absent representation.
    #[error("storage engine error: {0:#}")]
    Engine(anyhow::Error),

    /// Async task panicked or was aborted.
    #[error("async task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// Invalid registry configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a decode error for `key`.
    pub fn decode(key: impl Into<String>, source: CodecError) -> Self {
        Self::Decode {
            key: key.into(),
            source,
        }
    }

    /// Create an encode error for `key`.
    pub fn encode(key: impl Into<String>, source: CodecError) -> Self {
        Self::Encode {
            key: key.into(),
            source,
        }
    }

    /// Returns true if this error came from decoding stored data.
    #[must_use]
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode { .. })
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Engine(err)
    }
}
