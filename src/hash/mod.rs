//! Content digests and the chunked hashing pipeline.
//!
//! - [`plan`]: splitting an object into contiguous chunks
//! - [`pipeline`]: reading and hashing chunks in parallel through any [`ReadAt`](crate::ReadAt)

mod pipeline;
mod plan;

pub use pipeline::hash_chunks;
pub use plan::{Chunk, ChunkPlan};

use std::fmt;

use sha2::{Digest as _, Sha256};

use crate::error::{Error, Result};

/// Which hash algorithm to apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestScheme {
    Md5,
    Sha256,
}

impl DigestScheme {
    /// Digest length in bytes.
    pub const fn size(self) -> usize {
        match self {
            DigestScheme::Md5 => 16,
            DigestScheme::Sha256 => 32,
        }
    }

    /// Select a scheme by its digest length.
    pub fn from_size(size: usize) -> Result<Self> {
        match size {
            16 => Ok(DigestScheme::Md5),
            32 => Ok(DigestScheme::Sha256),
            other => Err(Error::UnsupportedDigest(other)),
        }
    }

    pub fn hasher(self) -> Hasher {
        match self {
            DigestScheme::Md5 => Hasher::Md5(md5::Context::new()),
            DigestScheme::Sha256 => Hasher::Sha256(Sha256::new()),
        }
    }

    /// Hash `data` in one pass.
    pub fn digest(self, data: &[u8]) -> Digest {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }
}

impl fmt::Display for DigestScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DigestScheme::Md5 => f.write_str("md5"),
            DigestScheme::Sha256 => f.write_str("sha256"),
        }
    }
}

/// Incremental hasher for one [`DigestScheme`].
pub enum Hasher {
    Md5(md5::Context),
    Sha256(Sha256),
}

impl Hasher {
    pub fn update(&mut self, data: &[u8]) {
        match self {
            Hasher::Md5(ctx) => ctx.consume(data),
            Hasher::Sha256(sha) => sha.update(data),
        }
    }

    pub fn finalize(self) -> Digest {
        match self {
            Hasher::Md5(ctx) => Digest {
                scheme: DigestScheme::Md5,
                bytes: ctx.compute().0.to_vec(),
            },
            Hasher::Sha256(sha) => Digest {
                scheme: DigestScheme::Sha256,
                bytes: sha.finalize().to_vec(),
            },
        }
    }
}

/// A finished digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    scheme: DigestScheme,
    bytes: Vec<u8>,
}

impl Digest {
    pub fn scheme(&self) -> DigestScheme {
        self.scheme
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.bytes)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
