/// A contiguous span of the object, hashed on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunk {
    /// Position in the plan (0-based)
    pub index: usize,
    /// Starting byte offset
    pub offset: u64,
    /// Span in bytes
    pub len: u64,
}

/// Ordered chunks covering `[0, content_length)` with no gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPlan {
    chunks: Vec<Chunk>,
}

impl ChunkPlan {
    /// Split `content_length` bytes into chunks of `chunk_size`.
    ///
    /// A `chunk_size` of 0, or one at least as large as the content, yields a
    /// single chunk. Otherwise there are `ceil(content_length / chunk_size)`
    /// chunks and the last one holds the remainder. Empty content still gets
    /// one zero-length chunk.
    pub fn new(content_length: u64, chunk_size: u64) -> Self {
        if chunk_size == 0 || chunk_size >= content_length {
            return Self {
                chunks: vec![Chunk {
                    index: 0,
                    offset: 0,
                    len: content_length,
                }],
            };
        }

        let count = content_length.div_ceil(chunk_size);
        let chunks = (0..count)
            .map(|i| {
                let offset = i * chunk_size;
                Chunk {
                    index: i as usize,
                    offset,
                    len: chunk_size.min(content_length - offset),
                }
            })
            .collect();

        Self { chunks }
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Number of chunks. Always at least one.
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_last(&self, index: usize) -> bool {
        index + 1 == self.chunks.len()
    }

    /// Span of every chunk but the last.
    pub fn chunk_span(&self) -> u64 {
        self.chunks[0].len
    }

    pub fn total_len(&self) -> u64 {
        self.chunks.iter().map(|c| c.len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(plan: &ChunkPlan) -> Vec<u64> {
        plan.chunks().iter().map(|c| c.len).collect()
    }

    #[test]
    fn test_remainder_chunk() {
        let plan = ChunkPlan::new(1000, 300);
        assert_eq!(spans(&plan), vec![300, 300, 300, 100]);
        let offsets: Vec<u64> = plan.chunks().iter().map(|c| c.offset).collect();
        assert_eq!(offsets, vec![0, 300, 600, 900]);
        assert!(plan.is_last(3));
        assert!(!plan.is_last(2));
        assert_eq!(plan.chunk_span(), 300);
    }

    #[test]
    fn test_exact_multiple() {
        let plan = ChunkPlan::new(900, 300);
        assert_eq!(spans(&plan), vec![300, 300, 300]);
    }

    #[test]
    fn test_whole_object_when_unchunked() {
        assert_eq!(spans(&ChunkPlan::new(500, 0)), vec![500]);
        assert_eq!(spans(&ChunkPlan::new(500, 500)), vec![500]);
        assert_eq!(spans(&ChunkPlan::new(500, 10_000)), vec![500]);
    }

    #[test]
    fn test_empty_content() {
        let plan = ChunkPlan::new(0, 0);
        assert_eq!(spans(&plan), vec![0]);
        assert_eq!(ChunkPlan::new(0, 300).len(), 1);
    }

    #[test]
    fn test_plan_covers_content_exactly() {
        for (length, size) in [(1, 1), (7, 2), (1000, 1), (1001, 10), (4096, 4095), (12345, 678)] {
            let plan = ChunkPlan::new(length, size);
            assert_eq!(plan.total_len(), length);
            assert_eq!(plan.len() as u64, length.div_ceil(size));

            let mut next = 0;
            for (i, chunk) in plan.chunks().iter().enumerate() {
                assert_eq!(chunk.index, i);
                assert_eq!(chunk.offset, next);
                assert!(chunk.len > 0);
                next += chunk.len;
            }
            let last = plan.chunks().last().unwrap();
            assert_eq!(last.len, length - size * (plan.len() as u64 - 1));
        }
    }
}
