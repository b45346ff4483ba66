use md5::{Digest, Md5};

use crate::TransferError;

/// Computes the MD5 fingerprint of `body` and returns it hex-encoded.
///
/// An empty body is rejected.
pub fn compute_hash(body: &[u8]) -> Result<String, TransferError> {
    if body.is_empty() {
        return Err(TransferError::InvalidArgument(
            "cannot fingerprint an empty body".into(),
        ));
    }

    let mut hasher = Md5::new();
    hasher.update(body);
    Ok(hex::encode(hasher.finalize()))
}

/// Compares two fingerprints ignoring ASCII case.
pub fn fingerprints_match(expected: &str, actual: &str) -> bool {
    expected.eq_ignore_ascii_case(actual)
}
