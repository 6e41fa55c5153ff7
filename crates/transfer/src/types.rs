use std::path::{Path, PathBuf};

use crate::{ChunkPlan, DEFAULT_CHUNK_SIZE, TransferError};

/// One contiguous byte range of an upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    /// First byte of the chunk.
    pub start: u64,
    /// One past the last byte of the chunk.
    pub end: u64,
    /// 1-based part number.
    pub part_number: u32,
}

impl ChunkDescriptor {
    /// Number of bytes in this chunk.
    pub fn len(&self) -> u64 {
        self.end - self.start
    }

    /// Returns `true` for a zero-length chunk.
    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }

    /// `Content-Range` value for this chunk; the end offset is inclusive.
    ///
    /// An empty chunk at offset 0 renders as `bytes 0-0/0`.
    pub fn content_range(&self, total: u64) -> String {
        let last = self.end.saturating_sub(1).max(self.start);
        format!("bytes {}-{}/{}", self.start, last, total)
    }
}

/// A single file upload to one presigned destination.
///
/// Owned by the caller for the duration of the upload and never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadTask {
    pub path: PathBuf,
    pub destination: String,
    pub content_type: String,
    pub chunk_size: u64,
    pub total_size: u64,
}

impl UploadTask {
    /// Builds a task for `path`, reading its size and guessing its content type.
    ///
    /// If `chunk_size` is 0, [`DEFAULT_CHUNK_SIZE`] is used.
    pub fn from_file(
        path: &Path,
        destination: impl Into<String>,
        chunk_size: u64,
    ) -> Result<Self, TransferError> {
        crate::validate_upload_source(path)?;
        let total_size = std::fs::metadata(path)?.len();
        Ok(Self {
            path: path.to_path_buf(),
            destination: destination.into(),
            content_type: crate::guess_content_type(path).to_string(),
            chunk_size: effective_chunk_size(chunk_size),
            total_size,
        })
    }

    /// Lazily yields the chunks covering `[0, total_size)`.
    pub fn chunks(&self) -> ChunkPlan {
        ChunkPlan::new(self.total_size, self.chunk_size)
    }

    /// Number of chunks the upload will issue.
    pub fn chunk_count(&self) -> u64 {
        self.total_size.div_ceil(effective_chunk_size(self.chunk_size))
    }
}

pub(crate) fn effective_chunk_size(chunk_size: u64) -> u64 {
    if chunk_size == 0 {
        DEFAULT_CHUNK_SIZE
    } else {
        chunk_size
    }
}
