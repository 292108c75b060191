//! Software-package manifests built from content digests.
//!
//! The manifest lists one asset per package with its chunk digests in hex,
//! so an installer can verify each chunk as it downloads.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::hash::{ChunkPlan, Digest, DigestScheme};

#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    #[serde(rename = "manifestItems")]
    pub items: Vec<Item>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub assets: Vec<Asset>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub md5_size: Option<u64>,
    #[serde(rename = "md5_hash_strings", skip_serializing_if = "Vec::is_empty")]
    pub md5s: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256_size: Option<u64>,
    #[serde(rename = "sha256_hash_strings", skip_serializing_if = "Vec::is_empty")]
    pub sha256s: Vec<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    pub bundle_identifier: String,
    pub bundle_version: String,
    pub kind: String,
    pub title: String,
}

impl Asset {
    /// Build a `software-package` asset from ordered chunk digests.
    ///
    /// The recorded size is the chunk span, or the whole length when the
    /// object was hashed as one chunk.
    pub fn from_digests(
        url: impl Into<String>,
        content_length: u64,
        chunk_size: u64,
        digests: &[Digest],
    ) -> Result<Self> {
        let Some(first) = digests.first() else {
            return Err(Error::NoDigests);
        };

        let size = ChunkPlan::new(content_length, chunk_size).chunk_span();
        let hashes: Vec<String> = digests.iter().map(Digest::to_hex).collect();

        let mut asset = Asset {
            kind: "software-package".to_string(),
            md5_size: None,
            md5s: Vec::new(),
            sha256_size: None,
            sha256s: Vec::new(),
            url: url.into(),
        };
        match first.scheme() {
            DigestScheme::Md5 => {
                asset.md5_size = Some(size);
                asset.md5s = hashes;
            }
            DigestScheme::Sha256 => {
                asset.sha256_size = Some(size);
                asset.sha256s = hashes;
            }
        }

        Ok(asset)
    }
}

impl Metadata {
    /// Package metadata. Without a title, one is derived from the last
    /// component of the bundle identifier.
    pub fn new(bundle_identifier: String, bundle_version: String, title: Option<String>) -> Self {
        let title = title
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| title_from_identifier(&bundle_identifier));
        Self {
            bundle_identifier,
            bundle_version,
            kind: "software".to_string(),
            title,
        }
    }
}

fn title_from_identifier(id: &str) -> String {
    let last = id.rsplit('.').next().unwrap_or_default();
    let mut chars = last.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl Manifest {
    pub fn new(asset: Asset, metadata: Option<Metadata>) -> Self {
        Self {
            items: vec![Item {
                assets: vec![asset],
                metadata,
            }],
        }
    }

    /// Serialize as JSON indented by `indent` spaces, or compact when 0.
    pub fn to_json(&self, indent: usize) -> Result<String> {
        if indent == 0 {
            return Ok(serde_json::to_string(self)?);
        }

        let pad = " ".repeat(indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(pad.as_bytes());
        let mut out = Vec::new();
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        self.serialize(&mut ser)?;
        // serde_json only writes valid UTF-8.
        Ok(String::from_utf8_lossy(&out).into_owned())
    }
}
