//! Chunked multipart upload and the end-to-end fusion submission flow.
//!
//! # Pipeline
//!
//! 1. **Validate**: personal video, YouTube URL and thumbnail are present
//! 2. **Presign**: ask the backend for an object-storage upload URL
//! 3. **Upload**: PUT the video in 5 MiB parts, strictly in order
//! 4. **Process**: submit the storage key, thumbnail and YouTube URL
//!
//! A failed part aborts the whole upload; callers restart from part 1.

pub mod error;
pub mod pipeline;
pub mod types;
pub mod uploader;

pub use error::UploadError;
pub use pipeline::FusionPipeline;
pub use types::{FusionJob, FusionOutcome, PipelineEvent, Stage, UploadProgress, UploadReport};
pub use uploader::ChunkedUploader;
