//! In-memory transport double for tests.
//!
//! Serves one object, honours `Range` requests, and records every request
//! together with how many were in flight at once.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};

use super::{Request, Response, Transport};
use crate::error::Result;

pub(crate) struct MemoryTransport {
    data: Bytes,
    etag: Option<String>,
    accept_ranges: Option<&'static str>,
    head_status: StatusCode,
    get_status: StatusCode,
    range_status: StatusCode,
    short_by: usize,
    delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    completed: AtomicUsize,
    closed_idle: AtomicBool,
    requests: Mutex<Vec<Request>>,
}

impl MemoryTransport {
    pub(crate) fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            etag: Some("\"v1\"".to_string()),
            accept_ranges: Some("bytes"),
            head_status: StatusCode::OK,
            get_status: StatusCode::OK,
            range_status: StatusCode::PARTIAL_CONTENT,
            short_by: 0,
            delay: Duration::ZERO,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            closed_idle: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_etag(mut self, etag: &str) -> Self {
        self.etag = Some(etag.to_string());
        self
    }

    pub(crate) fn with_accept_ranges(mut self, value: Option<&'static str>) -> Self {
        self.accept_ranges = value;
        self
    }

    pub(crate) fn with_head_status(mut self, status: StatusCode) -> Self {
        self.head_status = status;
        self
    }

    /// Status for GETs without a `Range` header.
    pub(crate) fn with_get_status(mut self, status: StatusCode) -> Self {
        self.get_status = status;
        self
    }

    pub(crate) fn with_range_status(mut self, status: StatusCode) -> Self {
        self.range_status = status;
        self
    }

    /// Drop `n` bytes from the end of every range response.
    pub(crate) fn with_short_body(mut self, n: usize) -> Self {
        self.short_by = n;
        self
    }

    /// Hold every GET for `delay` before answering. HEAD is answered at once.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn closed_idle(&self) -> bool {
        self.closed_idle.load(Ordering::SeqCst)
    }

    pub(crate) fn count(&self, method: Method) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.method == method)
            .count()
    }

    /// `Range` header values of every ranged request, in arrival order.
    pub(crate) fn ranges(&self) -> Vec<String> {
        self.requests
            .lock()
            .iter()
            .filter_map(|r| r.range.map(|range| range.to_string()))
            .collect()
    }

    fn respond(&self, request: &Request) -> Response {
        let mut headers = HeaderMap::new();

        if request.method == Method::HEAD {
            headers.insert("content-length", HeaderValue::from(self.data.len()));
            if let Some(value) = self.accept_ranges {
                headers.insert("accept-ranges", HeaderValue::from_static(value));
            }
            if let Some(etag) = &self.etag {
                if let Ok(value) = HeaderValue::from_str(etag) {
                    headers.insert("etag", value);
                }
            }
            return body_response(self.head_status, headers, Bytes::new());
        }

        let Some(range) = request.range else {
            return body_response(self.get_status, headers, self.data.clone());
        };

        if self.range_status != StatusCode::PARTIAL_CONTENT {
            return body_response(self.range_status, headers, self.data.clone());
        }

        let len = self.data.len() as u64;
        let start = range.start.min(len) as usize;
        let end = range.end.saturating_add(1).min(len) as usize;
        let end = end.saturating_sub(self.short_by).max(start);
        body_response(
            StatusCode::PARTIAL_CONTENT,
            headers,
            self.data.slice(start..end),
        )
    }
}

fn body_response(status: StatusCode, headers: HeaderMap, data: Bytes) -> Response {
    // Split into small pieces so readers exercise the streaming path.
    let pieces: Vec<Result<Bytes>> = (0..data.len())
        .step_by(64)
        .map(|i| Ok(data.slice(i..(i + 64).min(data.len()))))
        .collect();
    Response {
        status,
        headers,
        body: Box::pin(stream::iter(pieces)),
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl<'a> InFlight<'a> {
    fn enter(counter: &'a AtomicUsize, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.requests.lock().push(request.clone());
        let _entered = InFlight::enter(&self.in_flight, &self.peak);

        if request.method == Method::GET && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self.respond(&request);
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(response)
    }

    fn close_idle_connections(&self) {
        self.closed_idle.store(true, Ordering::SeqCst);
    }
}
