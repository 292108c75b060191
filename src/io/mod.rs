mod gate;
mod http;
mod local;
mod range;
mod registry;
mod sequential;

pub use http::HttpReader;
pub use local::LocalFileReader;
pub use range::ByteRange;
pub use sequential::SequentialReader;

use crate::error::Result;
use async_trait::async_trait;

/// Trait for random access reading from a data source
#[async_trait]
pub trait ReadAt: Send + Sync {
    /// Fill `buf` with the bytes starting at `offset`.
    ///
    /// Returns `buf.len()` on success. When the source ends before the buffer
    /// is full the call fails with [`Error::Truncated`](crate::Error::Truncated)
    /// and the reported prefix of `buf` holds valid data.
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize>;

    /// Get the total size of the data source
    fn size(&self) -> u64;
}
