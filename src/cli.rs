use std::collections::BTreeMap;

use clap::{Parser, ValueEnum};

use crate::config::DEFAULT_MAX_CONCURRENT_READERS;
use crate::hash::DigestScheme;

/// One mebibyte, the unit of `--chunk-size`.
pub const MB: u64 = 1 << 20;

#[derive(Parser, Debug)]
#[command(name = "rangeread")]
#[command(version)]
#[command(about = "Hash remote packages with HTTP Range requests", long_about = None)]
#[command(after_help = "Examples:\n  \
  rangeread https://example.com/app.pkg               sha256 digests of 100 MiB chunks\n  \
  rangeread -c 0 -a md5 https://example.com/app.pkg   one md5 digest of the whole object\n  \
  rangeread -m --bundle-id com.example.app app.pkg    manifest JSON for a local package")]
pub struct Cli {
    /// Package HTTP URL or local file path
    #[arg(value_name = "SOURCE")]
    pub source: String,

    /// Hash chunk size in MiB (0 hashes the whole object as one chunk)
    #[arg(short = 'c', long, value_name = "MIB", default_value_t = 100)]
    pub chunk_size: u64,

    /// Maximum concurrent range requests
    #[arg(short = 'j', long, value_name = "N", default_value_t = DEFAULT_MAX_CONCURRENT_READERS)]
    pub max_readers: usize,

    /// Digest algorithm
    #[arg(short = 'a', long, value_enum, default_value_t = Algorithm::Sha256)]
    pub algorithm: Algorithm,

    /// Fail unless the server reports this Etag
    #[arg(long, value_name = "ETAG")]
    pub expect_etag: Option<String>,

    /// Fail unless the server reports this Content-Length
    #[arg(long, value_name = "BYTES")]
    pub expect_length: Option<u64>,

    /// Hash with a single plain GET when the server lacks range support
    #[arg(long)]
    pub allow_sequential: bool,

    /// Print a manifest instead of bare digests
    #[arg(short = 'm', long)]
    pub manifest: bool,

    /// Bundle identifier for the manifest metadata
    #[arg(long, requires = "manifest")]
    pub bundle_id: Option<String>,

    /// Bundle version for the manifest metadata
    #[arg(long, requires = "bundle_id", default_value = "")]
    pub bundle_version: String,

    /// Title for the manifest metadata
    #[arg(long, requires = "bundle_id")]
    pub title: Option<String>,

    /// Manifest JSON indentation (0 for compact output)
    #[arg(long, default_value_t = 4)]
    pub indent: usize,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Algorithm {
    Md5,
    Sha256,
}

impl From<Algorithm> for DigestScheme {
    fn from(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Md5 => DigestScheme::Md5,
            Algorithm::Sha256 => DigestScheme::Sha256,
        }
    }
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0
    }

    pub fn chunk_size_bytes(&self) -> u64 {
        self.chunk_size.saturating_mul(MB)
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (0, 0) => "warn",
            (0, 1) => "info,rangeread=debug",
            (0, _) => "trace",
            (1, _) => "error",
            _ => "off",
        }
    }

    /// Response headers the probe must see.
    pub fn expect_headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        if let Some(etag) = &self.expect_etag {
            headers.insert("Etag".to_string(), etag.clone());
        }
        if let Some(length) = self.expect_length {
            headers.insert("Content-Length".to_string(), length.to_string());
        }
        headers
    }
}
