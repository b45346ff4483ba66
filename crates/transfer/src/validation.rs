use filedock_protocol::FileId;

use crate::TransferError;

/// Validates the display name of a named upload.
pub fn validate_file_name(file_name: &str) -> Result<(), TransferError> {
    if file_name.is_empty() {
        return Err(TransferError::InvalidArgument("file name is empty".into()));
    }
    Ok(())
}

/// Validates an upload payload.
pub fn validate_body(body: Option<&[u8]>) -> Result<&[u8], TransferError> {
    match body {
        None => Err(TransferError::InvalidArgument("body is missing".into())),
        Some([]) => Err(TransferError::InvalidArgument("body is empty".into())),
        Some(body) => Ok(body),
    }
}

/// Validates that `id` refers to a file the service has persisted.
pub fn validate_assigned_id(id: FileId) -> Result<(), TransferError> {
    if !id.is_assigned() {
        return Err(TransferError::InvalidArgument(
            "file id is not assigned".into(),
        ));
    }
    Ok(())
}
