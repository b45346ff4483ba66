//! Client error types.

use filedock_transfer::{TransferError, TransportError};

/// Errors produced by [`FileClient`](crate::FileClient) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("no authenticated session")]
    NotAuthenticated,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("transfer error: {0}")]
    Transfer(TransferError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

// Argument and transport failures surface under their own variants, whichever
// layer detected them.
impl From<TransferError> for ClientError {
    fn from(err: TransferError) -> Self {
        match err {
            TransferError::InvalidArgument(msg) => Self::InvalidArgument(msg),
            TransferError::Transport(e) => Self::Transport(e),
            other => Self::Transfer(other),
        }
    }
}

/// Errors produced while reading or writing the client configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
