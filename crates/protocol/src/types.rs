use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a file stored by the service.
///
/// `0` means the service has not assigned an id yet (fresh or temporary upload).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub i64);

impl FileId {
    /// Placeholder id of a record the service has never persisted.
    pub const UNASSIGNED: FileId = FileId(0);

    /// Returns `true` once the service has assigned this id.
    pub fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<i64> for FileId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Opaque handle of one begin/finish transfer sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationId(pub Uuid);

impl OperationId {
    /// Generates a fresh random operation id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authenticated session on the remote service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Session used for anonymous metadata lookups.
    pub fn anonymous() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_anonymous(&self) -> bool {
        self.0.is_nil()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Token returned by the service when a file is shared publicly.
pub type ShareToken = String;

/// File metadata as reported by the service, without the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileInfo {
    pub id: FileId,
    pub file_name: String,
    /// Declared payload length in bytes.
    pub body_length: u64,
    #[serde(default)]
    pub is_public: bool,
    pub creation_date: DateTime<Utc>,
    /// Hex fingerprint of the uncompressed payload.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
}
