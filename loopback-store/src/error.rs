use thiserror::Error;

/// Result type for repository and storage operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by storage backends. The repository recovers from all of
/// them locally (reseed on load, log on persist).
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("invalid storage key `{key}`")]
    InvalidKey { key: String },

    #[error("store version {found} does not match expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("storage backend error: {message}")]
    Backend { message: String },

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn invalid_key<S: Into<String>>(key: S) -> Self {
        Self::InvalidKey { key: key.into() }
    }

    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }
}
