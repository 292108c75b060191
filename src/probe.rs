//! URL validation and the HEAD capability probe.
//!
//! Opening a reader goes through here exactly once. Every failure is fatal:
//! the caller gets an error and no reader.

use std::collections::BTreeMap;

use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::transport::{Request, Response, Transport};

/// What the HEAD probe learned about the remote object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Probe {
    /// Authoritative object size for every later bounds check.
    pub content_length: u64,
    /// Etag with surrounding quotes removed. Empty if the server sent none.
    pub etag: String,
}

/// Parse `raw`, requiring a scheme and a hostname.
pub fn validate_url(raw: &str) -> Result<Url> {
    let url = Url::parse(raw)?;

    if url.scheme().is_empty() {
        return Err(Error::InvalidScheme);
    }

    if url.host_str().is_none_or(str::is_empty) {
        return Err(Error::InvalidHost);
    }

    Ok(url)
}

/// Issue a HEAD request against `url` and check it can serve range reads.
///
/// Each entry of `expect` must match the corresponding response header.
/// `Etag` values are compared without their surrounding quotes.
pub async fn probe(
    transport: &dyn Transport,
    url: &Url,
    expect: &BTreeMap<String, String>,
) -> Result<Probe> {
    let resp = transport.send(Request::head(url.clone())).await?;

    if !resp.status.is_success() {
        return Err(Error::Request {
            status: resp.status,
            url: url.to_string(),
        });
    }

    if !accepts_byte_ranges(&resp) {
        return Err(Error::RangeNotSupported {
            url: url.to_string(),
        });
    }

    check_expected(&resp, expect)?;

    let content_length = resp
        .header("content-length")
        .and_then(|v| v.trim().parse().ok())
        .ok_or_else(|| Error::MissingContentLength {
            url: url.to_string(),
        })?;
    let etag = strip_quotes(resp.header("etag").unwrap_or_default()).to_string();

    debug!(%url, content_length, etag = %etag, "probed remote object");

    Ok(Probe {
        content_length,
        etag,
    })
}

fn accepts_byte_ranges(resp: &Response) -> bool {
    resp.header("accept-ranges").is_some_and(|v| {
        v.split(',')
            .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"))
    })
}

fn check_expected(resp: &Response, expect: &BTreeMap<String, String>) -> Result<()> {
    for (name, expected) in expect {
        let actual = resp.header(name).unwrap_or_default();

        if name.eq_ignore_ascii_case("etag") {
            if strip_quotes(actual) != strip_quotes(expected) {
                return Err(Error::EtagMismatch {
                    expected: expected.clone(),
                    actual: actual.to_string(),
                });
            }
        } else if name.eq_ignore_ascii_case("content-length") {
            if actual.trim() != expected.trim() {
                return Err(Error::ContentLengthMismatch {
                    expected: expected.clone(),
                    actual: actual.to_string(),
                });
            }
        } else if actual != expected {
            return Err(Error::HeaderMismatch {
                name: name.clone(),
                expected: expected.clone(),
                actual: actual.to_string(),
            });
        }
    }

    Ok(())
}

pub(crate) fn strip_quotes(s: &str) -> &str {
    s.trim_matches('"')
}
