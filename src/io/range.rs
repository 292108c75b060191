use std::fmt;

/// An inclusive byte span, rendered as the value of an HTTP `Range` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset
    pub start: u64,
    /// Last byte offset (inclusive)
    pub end: u64,
}

impl ByteRange {
    /// The span covering `len` bytes from `offset`, clamped to an object of
    /// `size` bytes.
    ///
    /// Returns `None` when nothing of the span lies inside the object.
    pub fn clamped(offset: u64, len: u64, size: u64) -> Option<Self> {
        if len == 0 || offset >= size {
            return None;
        }
        let end = offset.saturating_add(len - 1).min(size - 1);
        Some(Self { start: offset, end })
    }

    /// Number of bytes covered. Never zero.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "bytes={}-{}", self.start, self.end)
    }
}
