//! Raw deflate applied to whole payloads on the wire.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;

use crate::TransferError;

/// Deflates `data` in one pass.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, TransferError> {
    let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).map_err(TransferError::Compression)?;
    encoder.finish().map_err(TransferError::Compression)
}

/// Inflates a deflate stream produced by [`compress`] or the service.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, TransferError> {
    let mut decoder = DeflateDecoder::new(data);
    let mut out = Vec::new();
    decoder
        .read_to_end(&mut out)
        .map_err(TransferError::Compression)?;
    Ok(out)
}
