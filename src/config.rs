//! Reader configuration.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::transport::{ReqwestTransport, Transport};

/// Default capacity of the admission gate.
pub const DEFAULT_MAX_CONCURRENT_READERS: usize = 5;

/// Everything needed to open a reader.
///
/// Fields are fixed once a reader has been opened from this config.
#[derive(Clone, Default)]
pub struct Config {
    /// Target URL (required).
    pub url: String,
    /// Transport override. A reqwest client is created when unset.
    pub transport: Option<Arc<dyn Transport>>,
    /// Response headers the HEAD probe must report, e.g. a previously seen
    /// `Etag` or `Content-Length`.
    pub expect_headers: BTreeMap<String, String>,
    /// Admission gate capacity. `0` selects [`DEFAULT_MAX_CONCURRENT_READERS`].
    pub max_concurrent_readers: usize,
    /// Chunk size used by `hash_url`. `0` hashes the whole object as one chunk.
    pub hash_chunk_size: u64,
}

impl Config {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Use a caller-supplied reqwest client.
    pub fn with_client(self, client: reqwest::Client) -> Self {
        self.with_transport(Arc::new(ReqwestTransport::with_client(client)))
    }

    pub fn with_expect_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.expect_headers.insert(name.into(), value.into());
        self
    }

    pub fn with_max_concurrent_readers(mut self, n: usize) -> Self {
        self.max_concurrent_readers = n;
        self
    }

    pub fn with_hash_chunk_size(mut self, size: u64) -> Self {
        self.hash_chunk_size = size;
        self
    }

    /// Gate capacity after applying the default.
    pub fn effective_max_concurrent_readers(&self) -> usize {
        match self.max_concurrent_readers {
            0 => DEFAULT_MAX_CONCURRENT_READERS,
            n => n,
        }
    }

    pub(crate) fn transport_or_default(&self) -> Result<Arc<dyn Transport>> {
        match &self.transport {
            Some(transport) => Ok(Arc::clone(transport)),
            None => Ok(Arc::new(ReqwestTransport::new()?)),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("url", &self.url)
            .field("custom_transport", &self.transport.is_some())
            .field("expect_headers", &self.expect_headers)
            .field("max_concurrent_readers", &self.max_concurrent_readers)
            .field("hash_chunk_size", &self.hash_chunk_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::new("https://example.com/a.pkg");
        assert_eq!(config.url, "https://example.com/a.pkg");
        assert!(config.transport.is_none());
        assert!(config.expect_headers.is_empty());
        assert_eq!(config.hash_chunk_size, 0);
        assert_eq!(
            config.effective_max_concurrent_readers(),
            DEFAULT_MAX_CONCURRENT_READERS
        );
    }

    #[test]
    fn test_builder_overrides() {
        let config = Config::new("https://example.com/a.pkg")
            .with_max_concurrent_readers(2)
            .with_hash_chunk_size(300)
            .with_expect_header("Etag", "abc");
        assert_eq!(config.effective_max_concurrent_readers(), 2);
        assert_eq!(config.hash_chunk_size, 300);
        assert_eq!(config.expect_headers.get("Etag").map(String::as_str), Some("abc"));
    }
}
