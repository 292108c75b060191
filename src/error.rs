//! Error types for rangeread.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid url: {0}")]
    InvalidUrl(#[source] url::ParseError),

    #[error("invalid url scheme")]
    InvalidScheme,

    #[error("invalid url host")]
    InvalidHost,

    #[error("range reads not supported by {url}")]
    RangeNotSupported { url: String },

    #[error("{url} did not return a usable Content-Length")]
    MissingContentLength { url: String },

    #[error("etag header differs: expected {expected:?}, got {actual:?}")]
    EtagMismatch { expected: String, actual: String },

    #[error("content length differs: expected {expected:?}, got {actual:?}")]
    ContentLengthMismatch { expected: String, actual: String },

    #[error("{name} header differs: expected {expected:?}, got {actual:?}")]
    HeaderMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    #[error("error requesting {url}, received code: {status}")]
    Request { status: StatusCode, url: String },

    #[error("range not satisfied: {url} answered {status}")]
    RangeNotSatisfied { status: StatusCode, url: String },

    /// Fewer bytes were available than requested. The first `read` bytes of
    /// the buffer are valid.
    #[error("read truncated after {read} bytes")]
    Truncated { read: usize },

    #[error("read canceled")]
    Canceled,

    #[error("reader closed")]
    Closed,

    #[error("chunk {index} failed: {source}")]
    Chunk {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("chunk of {len} bytes does not fit in memory")]
    ChunkTooLarge { len: u64 },

    #[error("unsupported digest size: {0} bytes")]
    UnsupportedDigest(usize),

    #[error("unable to create asset: no digests available")]
    NoDigests,

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Whether this is a short read rather than a failed one.
    pub fn is_truncated(&self) -> bool {
        matches!(self, Error::Truncated { .. })
    }

    /// The innermost error, looking through chunk wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Chunk { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        match e {
            url::ParseError::RelativeUrlWithoutBase => Error::InvalidScheme,
            url::ParseError::EmptyHost => Error::InvalidHost,
            other => Error::InvalidUrl(other),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
