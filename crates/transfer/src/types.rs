use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use filedock_protocol::{FileId, FileInfo, OperationId};
use tracing::debug;

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// File metadata plus its payload, once materialized.
///
/// The body is set at most once: by a completed download, or at construction
/// for a local upload. Records are shared as `Arc<FileRecord>`, so a download
/// into a cached record is visible to every holder.
#[derive(Debug)]
pub struct FileRecord {
    info: FileInfo,
    body: OnceLock<Vec<u8>>,
}

impl FileRecord {
    /// Wraps metadata fetched from the service; the body is absent.
    pub fn from_info(info: FileInfo) -> Self {
        Self {
            info,
            body: OnceLock::new(),
        }
    }

    /// Builds a record that already holds its payload, e.g. new content for
    /// an existing file.
    pub fn with_body(info: FileInfo, body: Vec<u8>) -> Self {
        Self {
            info,
            body: OnceLock::from(body),
        }
    }

    /// Builds a record for a local upload.
    ///
    /// The id is unassigned and the creation date is taken from the local clock.
    pub fn for_upload(file_name: &str, body: Vec<u8>, is_public: bool, hash: String) -> Self {
        let info = FileInfo {
            id: FileId::UNASSIGNED,
            file_name: file_name.to_string(),
            body_length: body.len() as u64,
            is_public,
            creation_date: Utc::now(),
            hash,
        };
        Self {
            info,
            body: OnceLock::from(body),
        }
    }

    pub fn id(&self) -> FileId {
        self.info.id
    }

    pub fn file_name(&self) -> &str {
        &self.info.file_name
    }

    pub fn body_length(&self) -> u64 {
        self.info.body_length
    }

    pub fn is_public(&self) -> bool {
        self.info.is_public
    }

    pub fn creation_date(&self) -> DateTime<Utc> {
        self.info.creation_date
    }

    pub fn hash(&self) -> &str {
        &self.info.hash
    }

    pub fn info(&self) -> &FileInfo {
        &self.info
    }

    /// Payload bytes, if downloaded or supplied.
    pub fn body(&self) -> Option<&[u8]> {
        self.body.get().map(Vec::as_slice)
    }

    pub fn has_body(&self) -> bool {
        self.body.get().is_some()
    }

    /// Stores the payload. Returns `false` if a body was already set.
    pub(crate) fn set_body(&self, body: Vec<u8>) -> bool {
        self.body.set(body).is_ok()
    }

    /// Assigns the service id to a record that has none yet.
    pub(crate) fn assign_id(&mut self, id: FileId) {
        if !self.info.id.is_assigned() {
            self.info.id = id;
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of a transfer that did not fail.
///
/// Cancellation is a distinct outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome<T> {
    Completed(T),
    Cancelled,
}

impl<T> TransferOutcome<T> {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the completed value, or `None` if cancelled.
    pub fn completed(self) -> Option<T> {
        match self {
            Self::Completed(value) => Some(value),
            Self::Cancelled => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> TransferOutcome<U> {
        match self {
            Self::Completed(value) => TransferOutcome::Completed(f(value)),
            Self::Cancelled => TransferOutcome::Cancelled,
        }
    }
}

/// Kind of upload; only the begin call differs between them.
#[derive(Debug, Clone)]
pub enum UploadTarget {
    /// A new named file.
    New {
        file_name: String,
        body: Vec<u8>,
        is_public: bool,
    },
    /// Replaces the content of a persisted file with the record's body.
    Existing(Arc<FileRecord>),
    /// A temporary file that never receives a permanent id.
    Temporary { file_name: String, body: Vec<u8> },
}

/// A completed upload.
#[derive(Debug, Clone)]
pub struct Uploaded {
    pub operation: OperationId,
    /// The uploaded record; its id stays unassigned for temporary uploads.
    pub record: Arc<FileRecord>,
}

impl Uploaded {
    /// Returns `true` if the service persisted the file under an id.
    pub fn is_stored(&self) -> bool {
        self.record.id().is_assigned()
    }
}

/// How a part loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LoopExit {
    Finished,
    Cancelled,
}

// ---------------------------------------------------------------------------
// TransferSession
// ---------------------------------------------------------------------------

/// Direction of a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Upload,
    Download,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Upload => f.write_str("upload"),
            Self::Download => f.write_str("download"),
        }
    }
}

/// Lifecycle state of a single transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Pending,
    InProgress,
    Completed,
    Cancelled,
    Failed,
}

impl TransferState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

/// Tracks one begin/part/finish sequence.
///
/// Owned by the task driving the transfer; transitions are logged.
#[derive(Debug)]
pub struct TransferSession {
    operation: OperationId,
    direction: Direction,
    state: TransferState,
    total_bytes: u64,
    transferred_bytes: u64,
    parts: usize,
}

impl TransferSession {
    /// Creates a pending session for an operation returned by a begin call.
    pub fn new(operation: OperationId, direction: Direction, total_bytes: u64) -> Self {
        Self {
            operation,
            direction,
            state: TransferState::Pending,
            total_bytes,
            transferred_bytes: 0,
            parts: 0,
        }
    }

    pub fn start(&mut self) {
        self.transition(TransferState::InProgress);
    }

    /// Records one transferred part.
    pub fn add_part(&mut self, bytes: u64) {
        self.transferred_bytes += bytes;
        self.parts += 1;
        debug!(
            operation = %self.operation,
            direction = %self.direction,
            part = self.parts,
            bytes,
            transferred = self.transferred_bytes,
            total = self.total_bytes,
            "part transferred"
        );
    }

    pub fn complete(&mut self) {
        self.transition(TransferState::Completed);
    }

    pub fn cancel(&mut self) {
        self.transition(TransferState::Cancelled);
    }

    pub fn fail(&mut self) {
        self.transition(TransferState::Failed);
    }

    pub fn operation(&self) -> OperationId {
        self.operation
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> TransferState {
        self.state
    }

    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes
    }

    pub fn parts(&self) -> usize {
        self.parts
    }

    fn transition(&mut self, next: TransferState) {
        if self.state.is_terminal() {
            return;
        }
        debug!(
            operation = %self.operation,
            direction = %self.direction,
            from = ?self.state,
            to = ?next,
            "transfer state changed"
        );
        self.state = next;
    }
}
