use crate::MAX_PART_SIZE;

// ---------------------------------------------------------------------------
// PartReader
// ---------------------------------------------------------------------------

/// One slice of an outbound payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Part<'a> {
    /// Byte offset within the wire-encoded payload.
    pub offset: u64,
    pub data: &'a [u8],
}

/// Splits an in-memory payload into fixed-size parts, in order.
pub struct PartReader<'a> {
    data: &'a [u8],
    part_size: usize,
    offset: usize,
}

impl<'a> PartReader<'a> {
    /// Creates a reader over `data`.
    ///
    /// If `part_size` is 0, [`MAX_PART_SIZE`] is used.
    pub fn new(data: &'a [u8], part_size: usize) -> Self {
        let part_size = if part_size == 0 {
            MAX_PART_SIZE
        } else {
            part_size
        };
        Self {
            data,
            part_size,
            offset: 0,
        }
    }
}

impl<'a> Iterator for PartReader<'a> {
    type Item = Part<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.data.len() {
            return None;
        }
        let end = std::cmp::min(self.offset + self.part_size, self.data.len());
        let part = Part {
            offset: self.offset as u64,
            data: &self.data[self.offset..end],
        };
        self.offset = end;
        Some(part)
    }
}

// ---------------------------------------------------------------------------
// PartWriter
// ---------------------------------------------------------------------------

/// Accumulates inbound parts until the declared length is reached.
pub struct PartWriter {
    buf: Vec<u8>,
    expected_len: u64,
}

impl PartWriter {
    /// Creates a writer expecting `expected_len` bytes in total.
    pub fn new(expected_len: u64) -> Self {
        // Capped: the declared length comes from the service.
        let capacity = std::cmp::min(expected_len, 16 * MAX_PART_SIZE as u64) as usize;
        Self {
            buf: Vec::with_capacity(capacity),
            expected_len,
        }
    }

    /// Appends a received part and returns the new accumulated length.
    pub fn append(&mut self, part: &[u8]) -> u64 {
        self.buf.extend_from_slice(part);
        self.written()
    }

    /// Bytes accumulated so far; also the offset of the next part to fetch.
    pub fn written(&self) -> u64 {
        self.buf.len() as u64
    }

    /// Returns `true` once at least the declared length has been received.
    pub fn is_complete(&self) -> bool {
        self.written() >= self.expected_len
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}
