use async_trait::async_trait;
use futures_util::StreamExt;
use parking_lot::RwLock;
use reqwest::Client;
use reqwest::header::RANGE;
use std::time::Duration;

use super::{Request, Response, Transport};
use crate::error::{Error, Result};

/// [`Transport`] backed by a pooled reqwest client.
///
/// A client built by [`new`](Self::new) belongs to the transport and is
/// dropped when idle connections are released. A caller-supplied client is
/// shared with the caller and stays usable.
pub struct ReqwestTransport {
    // Taken on close so the pool is dropped once in-flight requests finish.
    client: RwLock<Option<Client>>,
    owned: bool,
}

impl ReqwestTransport {
    /// Create a transport with a default client.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client: RwLock::new(Some(client)),
            owned: true,
        })
    }

    /// Wrap a caller-supplied client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client: RwLock::new(Some(client)),
            owned: false,
        }
    }

    /// Whether requests can still be sent.
    pub fn is_open(&self) -> bool {
        self.client.read().is_some()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let client = self.client.read().clone().ok_or(Error::Closed)?;

        let mut builder = client.request(request.method, request.url);
        if let Some(range) = request.range {
            builder = builder.header(RANGE, range.to_string());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.bytes_stream().map(|chunk| chunk.map_err(Error::from));

        Ok(Response {
            status,
            headers,
            body: Box::pin(body),
        })
    }

    fn close_idle_connections(&self) {
        if self.owned {
            self.client.write().take();
        }
    }
}
