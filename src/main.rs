//! Main entry point for the rangeread CLI application.
//!
//! Hashes a package from a local path or an HTTP URL and prints the chunk
//! digests, or a software manifest built from them.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use rangeread::{
    Asset, Cli, Config, Digest, DigestScheme, Error, HttpReader, LocalFileReader, Manifest,
    Metadata, ReadAt, SequentialReader, hash_chunks,
};

/// Digests of one source plus what is needed to describe them.
struct Hashed {
    url: String,
    content_length: u64,
    chunk_size: u64,
    digests: Vec<Digest>,
    transferred: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let scheme = DigestScheme::from(cli.algorithm);
    let hashed = if cli.is_http_url() {
        hash_remote(&cli, scheme).await?
    } else {
        hash_local(&cli, scheme).await?
    };

    if cli.manifest {
        let asset = Asset::from_digests(
            hashed.url.clone(),
            hashed.content_length,
            hashed.chunk_size,
            &hashed.digests,
        )?;
        let metadata = cli
            .bundle_id
            .clone()
            .map(|id| Metadata::new(id, cli.bundle_version.clone(), cli.title.clone()));
        println!("{}", Manifest::new(asset, metadata).to_json(cli.indent)?);
    } else {
        for digest in &hashed.digests {
            println!("{digest}");
        }
    }

    // Network transfer statistics for HTTP sources
    if let Some(transferred) = hashed.transferred
        && !cli.is_quiet()
    {
        eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
    }

    Ok(())
}

async fn hash_remote(cli: &Cli, scheme: DigestScheme) -> Result<Hashed> {
    let config = cli.expect_headers().into_iter().fold(
        Config::new(cli.source.clone())
            .with_max_concurrent_readers(cli.max_readers)
            .with_hash_chunk_size(cli.chunk_size_bytes()),
        |config, (name, value)| config.with_expect_header(name, value),
    );

    let reader = match HttpReader::open(config.clone()).await {
        Ok(reader) => reader,
        Err(Error::RangeNotSupported { url }) if cli.allow_sequential => {
            warn!(%url, "server does not support range requests, hashing sequentially");
            return hash_sequential(&config, scheme).await;
        }
        Err(e) => return Err(e).with_context(|| format!("failed to open {}", cli.source)),
    };

    let result = reader.hash_url(scheme).await;
    reader.close().await;
    let digests = result.with_context(|| format!("failed to hash {}", cli.source))?;

    Ok(Hashed {
        url: reader.url().to_string(),
        content_length: reader.len(),
        chunk_size: reader.hash_chunk_size(),
        digests,
        transferred: Some(reader.transferred_bytes()),
    })
}

async fn hash_sequential(config: &Config, scheme: DigestScheme) -> Result<Hashed> {
    let reader = SequentialReader::new(config)?;
    let result = reader.hash_url(scheme).await;
    reader.close();
    let digest = result.with_context(|| format!("failed to hash {}", reader.url()))?;

    // One pass over the body, so the received count is the object length.
    let length = reader.transferred_bytes();
    Ok(Hashed {
        url: reader.url().to_string(),
        content_length: length,
        chunk_size: 0,
        digests: vec![digest],
        transferred: Some(length),
    })
}

async fn hash_local(cli: &Cli, scheme: DigestScheme) -> Result<Hashed> {
    let path = Path::new(&cli.source);
    let reader =
        LocalFileReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let content_length = reader.size();
    let chunk_size = cli.chunk_size_bytes();
    let digests = hash_chunks(reader, chunk_size, scheme)
        .await
        .with_context(|| format!("failed to hash {}", path.display()))?;

    Ok(Hashed {
        url: cli.source.clone(),
        content_length,
        chunk_size,
        digests,
        transferred: None,
    })
}

/// Format a byte size into a human-readable string.
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
