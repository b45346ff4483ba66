//! Value types exchanged with the remote file service.
//!
//! Nothing here knows how calls are encoded on the wire; the transport
//! implementation maps these types to and from its own format.

pub mod status;
pub mod types;

pub use status::{ErrorCode, FinishUploadResult};
pub use types::{FileId, FileInfo, OperationId, SessionId, ShareToken};
