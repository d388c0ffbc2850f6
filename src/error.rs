//! Error types for the doomie server and client.

use crate::store::StoreError;

/// Top-level error type for the habit tracker.
#[derive(Debug, thiserror::Error)]
pub enum DoomieError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Document store error.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// HTTP server error (bind, serve).
    #[error("server error: {0}")]
    Server(String),

    /// HTTP client error (board, client library).
    #[error("client error: {0}")]
    Client(String),

    /// Logging setup error.
    #[error("logging error: {0}")]
    Logging(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, DoomieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_config() {
        let err = DoomieError::Config("port must be a number".into());
        assert_eq!(err.to_string(), "config error: port must be a number");
    }

    #[test]
    fn store_errors_convert() {
        let err: DoomieError = StoreError::Lock("poisoned".into()).into();
        assert_eq!(err.to_string(), "store error: lock poisoned: poisoned");
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DoomieError>();
    }
}
