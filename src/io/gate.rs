//! Admission gate in front of the transport.

use std::sync::Arc;

use reqwest::StatusCode;
use tokio::sync::Semaphore;
use url::Url;

use super::ByteRange;
use crate::error::{Error, Result};
use crate::transport::{Request, Transport};

/// Gated range-read capability.
///
/// At most `capacity` requests are on the wire at once. A permit is held
/// from before the request is sent until its body has been copied out.
pub(crate) struct Gate {
    permits: Semaphore,
    capacity: usize,
    transport: Arc<dyn Transport>,
}

impl Gate {
    pub(crate) fn new(transport: Arc<dyn Transport>, capacity: usize) -> Self {
        Self {
            permits: Semaphore::new(capacity),
            capacity,
            transport,
        }
    }

    /// GET `range` of `url` into the front of `buf`.
    ///
    /// Returns how many bytes the server delivered, at most `range.len()`.
    pub(crate) async fn read_range(
        &self,
        url: &Url,
        range: ByteRange,
        buf: &mut [u8],
    ) -> Result<usize> {
        let _permit = self.permits.acquire().await.map_err(|_| Error::Closed)?;

        let resp = self
            .transport
            .send(Request::get(url.clone()).with_range(range))
            .await?;

        if resp.status != StatusCode::PARTIAL_CONTENT {
            return Err(Error::RangeNotSatisfied {
                status: resp.status,
                url: url.to_string(),
            });
        }

        // A range longer than the address space is still capped by `buf`.
        let want = usize::try_from(range.len()).map_or(buf.len(), |len| len.min(buf.len()));
        resp.read_into(&mut buf[..want]).await
    }

    /// Refuse further admissions. Waiting callers fail with [`Error::Closed`].
    pub(crate) fn close(&self) {
        self.permits.close();
    }

    pub(crate) fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn available(&self) -> usize {
        self.permits.available_permits()
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::memory::MemoryTransport;
    use futures_util::future::join_all;
    use std::time::Duration;

    fn url() -> Url {
        Url::parse("https://example.com/a.pkg").unwrap()
    }

    #[tokio::test]
    async fn test_read_range() {
        let data: Vec<u8> = (0..=255).collect();
        let gate = Gate::new(Arc::new(MemoryTransport::new(data)), 2);

        let mut buf = [0u8; 4];
        let range = ByteRange::clamped(10, 4, 256).unwrap();
        let n = gate.read_range(&url(), range, &mut buf).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [10, 11, 12, 13]);
        assert_eq!(gate.available(), gate.capacity());
    }

    #[tokio::test]
    async fn test_bounds_concurrency() {
        let transport =
            Arc::new(MemoryTransport::new(vec![7u8; 100]).with_delay(Duration::from_millis(20)));
        let gate = Gate::new(transport.clone(), 2);

        let reads = (0..6).map(|i| {
            let gate = &gate;
            async move {
                let mut buf = [0u8; 10];
                let range = ByteRange::clamped(i * 10, 10, 100).unwrap();
                gate.read_range(&url(), range, &mut buf).await
            }
        });
        let results = join_all(reads).await;

        assert!(results.iter().all(|r| matches!(r, Ok(10))));
        assert_eq!(transport.count(reqwest::Method::GET), 6);
        assert!(transport.peak() <= 2, "peak was {}", transport.peak());
        assert_eq!(gate.available(), 2);
    }

    #[tokio::test]
    async fn test_non_partial_status() {
        let transport = MemoryTransport::new(vec![0u8; 10]).with_range_status(StatusCode::OK);
        let gate = Gate::new(Arc::new(transport), 1);

        let mut buf = [0u8; 4];
        let range = ByteRange::clamped(0, 4, 10).unwrap();
        let err = gate.read_range(&url(), range, &mut buf).await.unwrap_err();
        assert!(matches!(err, Error::RangeNotSatisfied { status, .. } if status == StatusCode::OK));
        assert_eq!(gate.available(), 1);
    }

    #[tokio::test]
    async fn test_oversized_range_fills_buffer_only() {
        let data: Vec<u8> = (0..=255).collect();
        let gate = Gate::new(Arc::new(MemoryTransport::new(data)), 1);

        let mut buf = [0u8; 4];
        let range = ByteRange {
            start: 0,
            end: u64::MAX - 1,
        };
        let n = gate.read_range(&url(), range, &mut buf).await.unwrap();
        assert_eq!(n, 4);
        assert_eq!(buf, [0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn test_closed_gate() {
        let gate = Gate::new(Arc::new(MemoryTransport::new(vec![0u8; 10])), 1);
        gate.close();

        let mut buf = [0u8; 4];
        let range = ByteRange::clamped(0, 4, 10).unwrap();
        let err = gate.read_range(&url(), range, &mut buf).await.unwrap_err();
        assert!(matches!(err, Error::Closed));
    }
}
