//! Chunk planning, file reading and progress math for multipart uploads.
//!
//! Nothing in this crate touches the network: it turns a file on disk into
//! an ordered sequence of byte ranges and tracks how much of it has been sent.

mod chunked;
mod progress;
mod types;
mod validation;

pub use chunked::{ChunkPlan, ChunkReader, sha256_hex};
pub use progress::{ProgressCounter, TransferRate, progress_percent};
pub use types::{ChunkDescriptor, UploadTask};
pub use validation::{file_name, guess_content_type, validate_upload_source};

/// Default chunk size: 5 MiB.
///
/// Object storage rejects multipart parts smaller than this (except the last).
pub const DEFAULT_CHUNK_SIZE: u64 = 5 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid upload source: {0}")]
    InvalidSource(String),

    #[error("chunk {part} out of bounds: {end} > {total}")]
    OutOfBounds { part: u32, end: u64, total: u64 },
}
