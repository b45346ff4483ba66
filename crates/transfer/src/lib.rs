//! Chunked file transfer against a remote file service.
//!
//! Payloads move in bounded parts through a begin → part* → finish call
//! sequence, with optional deflate compression, MD5 fingerprints, progress
//! reporting and cooperative cancellation.

pub mod cache;
mod chunked;
pub mod compression;
mod download;
mod hash;
mod progress;
mod service;
mod types;
mod upload;
mod validation;

pub use cache::MetadataCache;
pub use chunked::{Part, PartReader, PartWriter};
pub use download::ChunkedDownloader;
pub use hash::{compute_hash, fingerprints_match};
pub use progress::{ProgressCallback, TransferControl};
pub use service::{FileService, ServiceFuture, TransportError};
pub use types::{
    Direction, FileRecord, TransferOutcome, TransferSession, TransferState, UploadTarget, Uploaded,
};
pub use upload::ChunkedUploader;
pub use validation::{validate_assigned_id, validate_body, validate_file_name};

use filedock_protocol::ErrorCode;

/// Maximum size of one transfer part: 100 KiB.
///
/// Applies to upload chunking (on the wire-encoded stream) and to the bound
/// requested for each downloaded part.
pub const MAX_PART_SIZE: usize = 100 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("service error: {0}")]
    Service(#[from] ErrorCode),

    #[error("file hash mismatch: service reported {expected}, computed {actual}")]
    Integrity { expected: String, actual: String },

    #[error("received {actual} bytes, expected {expected}")]
    LengthMismatch { expected: u64, actual: u64 },

    #[error("service returned an empty part at offset {offset}")]
    EmptyPart { offset: u64 },

    #[error("compression error: {0}")]
    Compression(std::io::Error),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}
