//! HTTP transport abstraction.
//!
//! Readers never talk to reqwest directly. They hand a [`Request`] to a
//! [`Transport`] and get back a [`Response`] whose body is a byte stream.
//! This keeps the range arithmetic and lifecycle handling independent of the
//! HTTP client, and lets tests substitute an in-memory server.

mod client;
#[cfg(test)]
pub(crate) mod memory;

pub use client::ReqwestTransport;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use url::Url;

use crate::error::Result;
use crate::io::ByteRange;

/// Response body as a stream of byte chunks.
pub type BodyStream = BoxStream<'static, Result<Bytes>>;

/// Minimal HTTP capability needed by the readers.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return once the response head has arrived.
    async fn send(&self, request: Request) -> Result<Response>;

    /// Release pooled connections. Called when a reader closes.
    fn close_idle_connections(&self) {}
}

/// An outgoing request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    /// Sent as the `Range` header when present
    pub range: Option<ByteRange>,
}

impl Request {
    pub fn head(url: Url) -> Self {
        Self {
            method: Method::HEAD,
            url,
            range: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            range: None,
        }
    }

    pub fn with_range(mut self, range: ByteRange) -> Self {
        self.range = Some(range);
        self
    }
}

/// A response whose body has not been read yet.
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: BodyStream,
}

impl Response {
    /// Header value as a string, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Collect the whole body.
    pub async fn bytes(self) -> Result<Bytes> {
        let mut body = self.body;
        let mut collected = BytesMut::new();
        while let Some(chunk) = body.next().await {
            collected.extend_from_slice(&chunk?);
        }
        Ok(collected.freeze())
    }

    /// Copy the body into `buf`, stopping once it is full.
    ///
    /// Returns the number of bytes written, which is less than `buf.len()`
    /// when the body ended early.
    pub async fn read_into(self, buf: &mut [u8]) -> Result<usize> {
        let mut body = self.body;
        let mut filled = 0;
        while filled < buf.len() {
            let Some(chunk) = body.next().await else {
                break;
            };
            let chunk = chunk?;
            let n = chunk.len().min(buf.len() - filled);
            buf[filled..filled + n].copy_from_slice(&chunk[..n]);
            filled += n;
        }
        Ok(filled)
    }
}
