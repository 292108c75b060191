use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{Chunk, ChunkPlan, Digest, DigestScheme};
use crate::error::{Error, Result};
use crate::io::ReadAt;

/// Hash `reader` in chunks of `chunk_size`, one task per chunk.
///
/// Digests come back in chunk order regardless of which read finishes first.
/// A short read on the final chunk is hashed as-is. Every chunk runs to
/// completion; if any failed, the failure with the lowest chunk index is
/// returned and the others are logged.
pub async fn hash_chunks<R>(reader: R, chunk_size: u64, scheme: DigestScheme) -> Result<Vec<Digest>>
where
    R: ReadAt + Clone + 'static,
{
    let plan = ChunkPlan::new(reader.size(), chunk_size);
    debug!(
        content_length = reader.size(),
        chunks = plan.len(),
        %scheme,
        "hashing chunks"
    );

    let mut tasks = JoinSet::new();
    for &chunk in plan.chunks() {
        let reader = reader.clone();
        let last = plan.is_last(chunk.index);
        tasks.spawn(async move { (chunk.index, hash_chunk(&reader, chunk, last, scheme).await) });
    }

    let mut results = Vec::with_capacity(plan.len());
    while let Some(joined) = tasks.join_next().await {
        results.push(joined?);
    }
    results.sort_by_key(|(index, _)| *index);

    let mut digests = Vec::with_capacity(results.len());
    let mut failure = None;
    for (index, result) in results {
        match result {
            Ok(digest) => digests.push(digest),
            Err(e) => {
                warn!(index, error = %e, "chunk hash failed");
                if failure.is_none() {
                    failure = Some(Error::Chunk {
                        index,
                        source: Box::new(e),
                    });
                }
            }
        }
    }

    match failure {
        Some(e) => Err(e),
        None => Ok(digests),
    }
}

async fn hash_chunk<R: ReadAt>(
    reader: &R,
    chunk: Chunk,
    last: bool,
    scheme: DigestScheme,
) -> Result<Digest> {
    let mut buf = vec![0u8; buffer_len(chunk.len)?];

    let n = match reader.read_at(chunk.offset, &mut buf).await {
        Ok(n) => n,
        Err(Error::Truncated { read }) if last => {
            debug!(index = chunk.index, read, expected = chunk.len, "final chunk truncated");
            read
        }
        Err(e) => return Err(e),
    };

    Ok(scheme.digest(&buf[..n]))
}

fn buffer_len(len: u64) -> Result<usize> {
    usize::try_from(len).map_err(|_| Error::ChunkTooLarge { len })
}
