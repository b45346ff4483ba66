//! Remote file service trait.
//!
//! The application implements [`FileService`] on top of its RPC transport;
//! the transfer state machines only see this trait.

use std::future::Future;
use std::pin::Pin;

use filedock_protocol::{
    ErrorCode, FileId, FileInfo, FinishUploadResult, OperationId, SessionId, ShareToken,
};

/// Boxed future returned by every [`FileService`] call.
pub type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// Failure of the underlying transport while delivering a call.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("remote call failed: {0}")]
    Remote(String),
}

/// Remote operations consumed by the transfer core.
///
/// Each call is delivered exactly once and completes before the next one is
/// issued for the same operation.
pub trait FileService: Send + Sync {
    /// Fetches file metadata (without payload).
    fn get_file_info(&self, session: SessionId, id: FileId) -> ServiceFuture<'_, FileInfo>;

    fn begin_download(
        &self,
        session: SessionId,
        id: FileId,
        use_compression: bool,
    ) -> ServiceFuture<'_, OperationId>;

    /// Returns at most `max_part_size` bytes starting at `offset` of the
    /// (uncompressed) payload, compressed if the operation negotiated it.
    fn download_part(
        &self,
        operation: OperationId,
        offset: u64,
        max_part_size: usize,
    ) -> ServiceFuture<'_, Vec<u8>>;

    /// Finishes a download and returns the service-side fingerprint.
    fn finish_download(&self, operation: OperationId, aborted: bool) -> ServiceFuture<'_, String>;

    fn begin_upload_new(
        &self,
        session: SessionId,
        file_name: &str,
        is_public: bool,
        use_compression: bool,
        hash: &str,
    ) -> ServiceFuture<'_, OperationId>;

    fn begin_upload_existing(
        &self,
        session: SessionId,
        id: FileId,
        use_compression: bool,
        hash: &str,
    ) -> ServiceFuture<'_, OperationId>;

    fn begin_upload_temporary(
        &self,
        session: SessionId,
        file_name: &str,
        use_compression: bool,
        hash: &str,
    ) -> ServiceFuture<'_, OperationId>;

    fn upload_part(&self, operation: OperationId, data: &[u8]) -> ServiceFuture<'_, ErrorCode>;

    fn finish_upload(
        &self,
        operation: OperationId,
        aborted: bool,
    ) -> ServiceFuture<'_, FinishUploadResult>;

    /// Remaining upload allowance of the session, in bytes.
    fn get_upload_quota(&self, session: SessionId) -> ServiceFuture<'_, i64>;

    fn share(&self, session: SessionId, id: FileId) -> ServiceFuture<'_, ShareToken>;

    fn unshare(&self, session: SessionId, id: FileId) -> ServiceFuture<'_, ()>;
}
