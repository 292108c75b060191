use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info};
use url::Url;

use super::gate::Gate;
use super::registry::Registry;
use super::{ByteRange, ReadAt};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::{self, Digest, DigestScheme};
use crate::probe::{self, Probe};

/// HTTP Range reader for remote objects
///
/// Clones share one admission gate, registry and lifecycle, so a clone can be
/// handed to each worker. [`close`](Self::close) affects every clone.
#[derive(Clone)]
pub struct HttpReader {
    inner: Arc<Inner>,
}

struct Inner {
    url: Url,
    hash_chunk_size: u64,
    probe: Mutex<Probe>,
    gate: Gate,
    registry: Registry,
    lifecycle: CancellationToken,
    tracker: TaskTracker,
    transferred_bytes: AtomicU64,
}

impl HttpReader {
    /// Open a reader for `config.url`
    ///
    /// This will send a HEAD request to verify Range support and get the object size
    pub async fn open(config: Config) -> Result<Self> {
        let url = probe::validate_url(&config.url)?;
        let transport = config.transport_or_default()?;
        let probe = probe::probe(transport.as_ref(), &url, &config.expect_headers).await?;
        let capacity = config.effective_max_concurrent_readers();

        info!(
            %url,
            content_length = probe.content_length,
            etag = %probe.etag,
            max_concurrent_readers = capacity,
            "opened range reader"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                url,
                hash_chunk_size: config.hash_chunk_size,
                probe: Mutex::new(probe),
                gate: Gate::new(transport, capacity),
                registry: Registry::default(),
                lifecycle: CancellationToken::new(),
                tracker: TaskTracker::new(),
                transferred_bytes: AtomicU64::new(0),
            }),
        })
    }

    /// Content length reported by the probe
    pub fn len(&self) -> u64 {
        self.inner.probe.lock().content_length
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Etag reported by the probe, without quotes
    pub fn etag(&self) -> String {
        self.inner.probe.lock().etag.clone()
    }

    pub fn url(&self) -> &Url {
        &self.inner.url
    }

    pub fn hash_chunk_size(&self) -> u64 {
        self.inner.hash_chunk_size
    }

    pub fn max_concurrent_readers(&self) -> usize {
        self.inner.gate.capacity()
    }

    /// Get total bytes transferred from network
    pub fn transferred_bytes(&self) -> u64 {
        self.inner.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Number of reads currently registered
    pub fn in_flight(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lifecycle.is_cancelled()
    }

    /// Hash the whole object in chunks of the configured size.
    ///
    /// See [`hash_chunks`](crate::hash::hash_chunks) for ordering and error
    /// reporting.
    pub async fn hash_url(&self, scheme: DigestScheme) -> Result<Vec<Digest>> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        hash::hash_chunks(self.clone(), self.inner.hash_chunk_size, scheme).await
    }

    /// Cancel every in-flight read and wait for all of them to return.
    ///
    /// Once this returns no request issued by this reader is still running.
    /// Later reads fail with [`Error::Closed`]. Safe to call repeatedly.
    pub async fn close(&self) {
        let inner = &self.inner;

        if !inner.lifecycle.is_cancelled() {
            inner.lifecycle.cancel();
            let canceled = inner.registry.cancel_all();
            info!(url = %inner.url, canceled, "closing range reader");
        }

        inner.tracker.close();
        inner.tracker.wait().await;
        inner.gate.close();
        inner.gate.transport().close_idle_connections();
    }
}

impl Inner {
    async fn read_range(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let content_length = self.probe.lock().content_length;
        let Some(range) = ByteRange::clamped(offset, buf.len() as u64, content_length) else {
            debug!(offset, len = buf.len(), content_length, "read starts past end of object");
            return Err(Error::Truncated { read: 0 });
        };

        let read = self.registry.register(&self.lifecycle);
        debug!(id = read.id(), %range, "range read");

        let received = tokio::select! {
            biased;
            _ = read.token().cancelled() => {
                debug!(id = read.id(), "range read canceled");
                return Err(Error::Canceled);
            }
            result = self.gate.read_range(&self.url, range, buf) => result?,
        };

        self.transferred_bytes
            .fetch_add(received as u64, Ordering::Relaxed);

        if received < buf.len() {
            debug!(id = read.id(), received, requested = buf.len(), "range read truncated");
            return Err(Error::Truncated { read: received });
        }

        Ok(received)
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.lifecycle.cancel();
    }
}

#[async_trait]
impl ReadAt for HttpReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        self.inner
            .tracker
            .track_future(self.inner.read_range(offset, buf))
            .await
    }

    fn size(&self) -> u64 {
        self.len()
    }
}
