use serde::{Deserialize, Serialize};

use crate::types::FileId;

/// Status code reported by the service for a part upload or a finished upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
#[serde(from = "i64", into = "i64")]
pub enum ErrorCode {
    #[error("ok")]
    Ok,

    #[error("session is not authorized")]
    NotAuthorized,

    #[error("file not found")]
    FileNotFound,

    #[error("access denied")]
    AccessDenied,

    #[error("upload limit exceeded")]
    UploadLimitExceeded,

    #[error("content hash does not match")]
    HashMismatch,

    #[error("transfer operation not found")]
    OperationNotFound,

    #[error("invalid argument")]
    InvalidArgument,

    #[error("service error code {0}")]
    Unknown(i64),
}

impl ErrorCode {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1 => Self::NotAuthorized,
            2 => Self::FileNotFound,
            3 => Self::AccessDenied,
            4 => Self::UploadLimitExceeded,
            5 => Self::HashMismatch,
            6 => Self::OperationNotFound,
            7 => Self::InvalidArgument,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i64 {
        match self {
            Self::Ok => 0,
            Self::NotAuthorized => 1,
            Self::FileNotFound => 2,
            Self::AccessDenied => 3,
            Self::UploadLimitExceeded => 4,
            Self::HashMismatch => 5,
            Self::OperationNotFound => 6,
            Self::InvalidArgument => 7,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Self::Ok
    }

    /// Converts a non-success code into an error.
    pub fn into_result(self) -> Result<(), ErrorCode> {
        if self.is_ok() { Ok(()) } else { Err(self) }
    }
}

impl From<i64> for ErrorCode {
    fn from(code: i64) -> Self {
        Self::from_code(code)
    }
}

impl From<ErrorCode> for i64 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Outcome of a finished upload.
///
/// The service multiplexes this into one signed number: a positive value is the
/// assigned file id, zero marks a temporary upload, and a negative value is a
/// negated [`ErrorCode`]. Transports decode it once with [`FinishUploadResult::from_raw`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishUploadResult {
    Assigned(FileId),
    Temporary,
    Rejected(ErrorCode),
}

impl FinishUploadResult {
    pub fn from_raw(raw: i64) -> Self {
        match raw {
            0 => Self::Temporary,
            id if id > 0 => Self::Assigned(FileId(id)),
            negative => Self::Rejected(ErrorCode::from_code(negative.saturating_neg())),
        }
    }

    pub fn into_raw(self) -> i64 {
        match self {
            Self::Assigned(id) => id.0,
            Self::Temporary => 0,
            Self::Rejected(code) => code.code().saturating_neg(),
        }
    }
}
