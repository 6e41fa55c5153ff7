use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::types::{ChunkDescriptor, effective_chunk_size};
use crate::TransferError;

/// Computes SHA-256 of `data` and returns the hex-encoded digest.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

// ---------------------------------------------------------------------------
// ChunkPlan
// ---------------------------------------------------------------------------

/// Lazy, ordered partition of `[0, total)` into fixed-size chunks.
///
/// Every chunk but the last is exactly `chunk_size` bytes. A zero `total`
/// yields no chunks.
#[derive(Debug, Clone)]
pub struct ChunkPlan {
    total: u64,
    chunk_size: u64,
    next_start: u64,
    next_part: u32,
}

impl ChunkPlan {
    /// Plans `total` bytes in `chunk_size` pieces (0 means the default size).
    pub fn new(total: u64, chunk_size: u64) -> Self {
        Self {
            total,
            chunk_size: effective_chunk_size(chunk_size),
            next_start: 0,
            next_part: 1,
        }
    }

    /// Total bytes covered by the plan.
    pub fn total(&self) -> u64 {
        self.total
    }
}

impl Iterator for ChunkPlan {
    type Item = ChunkDescriptor;

    fn next(&mut self) -> Option<ChunkDescriptor> {
        if self.next_start >= self.total {
            return None;
        }
        let start = self.next_start;
        let end = start.saturating_add(self.chunk_size).min(self.total);
        let chunk = ChunkDescriptor {
            start,
            end,
            part_number: self.next_part,
        };
        self.next_start = end;
        self.next_part += 1;
        Some(chunk)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = (self.total - self.next_start.min(self.total)).div_ceil(self.chunk_size);
        let remaining = usize::try_from(remaining).unwrap_or(usize::MAX);
        (remaining, Some(remaining))
    }
}

// ---------------------------------------------------------------------------
// ChunkReader
// ---------------------------------------------------------------------------

/// Reads the bytes of a file chunk by chunk.
pub struct ChunkReader {
    file: std::fs::File,
    file_size: u64,
}

impl ChunkReader {
    /// Opens `path` for chunked reading.
    pub fn open(path: &Path) -> Result<Self, TransferError> {
        let file = std::fs::File::open(path)?;
        let file_size = file.metadata()?.len();
        Ok(Self { file, file_size })
    }

    /// Reads exactly the bytes described by `chunk`.
    pub fn read_chunk(&mut self, chunk: &ChunkDescriptor) -> Result<Vec<u8>, TransferError> {
        if chunk.end > self.file_size {
            return Err(TransferError::OutOfBounds {
                part: chunk.part_number,
                end: chunk.end,
                total: self.file_size,
            });
        }

        self.file.seek(SeekFrom::Start(chunk.start))?;
        let mut buf = vec![0u8; chunk.len() as usize];
        self.file.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Total file size in bytes.
    pub fn file_size(&self) -> u64 {
        self.file_size
    }
}
