use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::StreamExt;
use reqwest::StatusCode;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use url::Url;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::hash::{Digest, DigestScheme};
use crate::probe;
use crate::transport::{Request, Response, Transport};

/// Whole-body reader for servers without range support.
///
/// Every call issues one plain GET. There is no gate, no registry and no
/// chunking; use [`HttpReader`](super::HttpReader) when the server allows it.
pub struct SequentialReader {
    url: Url,
    transport: Arc<dyn Transport>,
    lifecycle: CancellationToken,
    transferred_bytes: AtomicU64,
}

impl SequentialReader {
    /// Validate `config.url`. No request is sent.
    pub fn new(config: &Config) -> Result<Self> {
        let url = probe::validate_url(&config.url)?;
        let transport = config.transport_or_default()?;
        Ok(Self {
            url,
            transport,
            lifecycle: CancellationToken::new(),
            transferred_bytes: AtomicU64::new(0),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Get total body bytes received
    pub fn transferred_bytes(&self) -> u64 {
        self.transferred_bytes.load(Ordering::Relaxed)
    }

    /// Read the start of the body into `buf`.
    ///
    /// Returns the number of bytes copied, which is the smaller of
    /// `buf.len()` and the body length.
    pub async fn read(&self, buf: &mut [u8]) -> Result<usize> {
        let resp = self.get().await?;
        let token = self.token()?;
        let n = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Canceled),
            result = resp.read_into(buf) => result?,
        };
        self.transferred_bytes.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }

    /// Stream the whole body through one hasher.
    pub async fn hash_url(&self, scheme: DigestScheme) -> Result<Digest> {
        let resp = self.get().await?;
        let token = self.token()?;

        let mut hasher = scheme.hasher();
        let mut body = resp.body;
        let mut total = 0u64;
        loop {
            let chunk = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(Error::Canceled),
                chunk = body.next() => chunk,
            };
            let Some(chunk) = chunk else {
                break;
            };
            let chunk = chunk?;
            total += chunk.len() as u64;
            self.transferred_bytes
                .fetch_add(chunk.len() as u64, Ordering::Relaxed);
            hasher.update(&chunk);
        }

        debug!(url = %self.url, bytes = total, %scheme, "hashed whole body");
        Ok(hasher.finalize())
    }

    /// Cancel in-flight requests and release idle connections. Safe to call
    /// repeatedly.
    pub fn close(&self) {
        if !self.lifecycle.is_cancelled() {
            info!(url = %self.url, "closing sequential reader");
        }
        self.lifecycle.cancel();
        self.transport.close_idle_connections();
    }

    fn token(&self) -> Result<CancellationToken> {
        if self.lifecycle.is_cancelled() {
            return Err(Error::Closed);
        }
        Ok(self.lifecycle.child_token())
    }

    async fn get(&self) -> Result<Response> {
        let token = self.token()?;
        let resp = tokio::select! {
            biased;
            _ = token.cancelled() => return Err(Error::Canceled),
            resp = self.transport.send(Request::get(self.url.clone())) => resp?,
        };

        if resp.status != StatusCode::OK {
            return Err(Error::Request {
                status: resp.status,
                url: self.url.to_string(),
            });
        }

        Ok(resp)
    }
}
