//! filedock client library.
//!
//! [`FileClient`] is the entry point: it resolves file metadata through a
//! process-wide cache and moves payloads through a caller-supplied
//! [`FileService`] in bounded, optionally compressed parts.
//!
//! # Flow
//!
//! - **get_file**: cache lookup-or-fetch, then a chunked download into the
//!   cached record
//! - **upload / update / upload_temporary**: fingerprint, chunked upload, then
//!   a cache insert keyed by the id the service assigned

mod client;
pub mod config;
pub mod error;
pub mod session;

pub use client::FileClient;
pub use config::{ClientConfig, DEFAULT_ENDPOINT};
pub use error::{ClientError, ConfigError};
pub use session::{SessionProvider, SessionSlot};

// Re-export the types needed to call the client.
pub use filedock_protocol::{FileId, FileInfo, OperationId, SessionId, ShareToken};
pub use filedock_transfer::{
    FileRecord, FileService, ProgressCallback, ServiceFuture, TransferControl, TransferError,
    TransferOutcome, TransportError,
};
pub use tokio_util::sync::CancellationToken;
