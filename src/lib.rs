//! # rangeread
//!
//! Random-access reads and chunked hashing of remote objects using HTTP
//! Range requests.
//!
//! An [`HttpReader`] probes a URL once with HEAD, then serves
//! [`ReadAt::read_at`] calls with ranged GETs. Archive parsers can walk a
//! multi-gigabyte package through it while only the bytes they touch cross
//! the network. The same reader hashes the whole object in parallel chunks
//! for manifest generation.
//!
//! ## Features
//!
//! - HEAD probe with `Accept-Ranges` check and optional Etag/Content-Length pins
//! - Bounded concurrency: at most N range requests on the wire per reader
//! - Parallel chunk hashing (MD5 or SHA-256) with deterministic digest order
//! - Cancellation-safe close that waits for every in-flight request
//! - Sequential whole-body fallback for servers without range support
//!
//! ## Example
//!
//! ```no_run
//! use rangeread::{Config, DigestScheme, HttpReader, ReadAt};
//!
//! #[tokio::main]
//! async fn main() -> rangeread::Result<()> {
//!     let config = Config::new("https://example.com/installer.pkg")
//!         .with_hash_chunk_size(100 << 20);
//!     let reader = HttpReader::open(config).await?;
//!
//!     // Read the archive header
//!     let mut header = [0u8; 28];
//!     reader.read_at(0, &mut header).await?;
//!
//!     // Hash the whole object in 100 MiB chunks
//!     for digest in reader.hash_url(DigestScheme::Sha256).await? {
//!         println!("{digest}");
//!     }
//!
//!     reader.close().await;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod io;
pub mod manifest;
pub mod probe;
pub mod transport;

pub use cli::Cli;
pub use config::{Config, DEFAULT_MAX_CONCURRENT_READERS};
pub use error::{Error, Result};
pub use hash::{Digest, DigestScheme, hash_chunks};
pub use io::{ByteRange, HttpReader, LocalFileReader, ReadAt, SequentialReader};
pub use manifest::{Asset, Manifest, Metadata};
pub use transport::{ReqwestTransport, Transport};
