//! Upload error types.

/// Errors produced while uploading or submitting a fusion job.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// Required input is missing or unusable.
    #[error("validation error: {0}")]
    Validation(String),

    /// A part exhausted its retries; the upload was aborted.
    #[error("upload of part {part} failed after {attempts} attempts: {source}")]
    Chunk {
        part: u32,
        attempts: u32,
        #[source]
        source: vidfuse_http::HttpError,
    },

    #[error("backend error: {0}")]
    Backend(#[from] vidfuse_backend::BackendError),

    #[error("transfer error: {0}")]
    Transfer(#[from] vidfuse_transfer::TransferError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl UploadError {
    /// Returns `true` if a request deadline caused the failure.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Chunk { source, .. } => source.is_timeout(),
            Self::Backend(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Human-readable message suitable for a dismissible error panel.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Chunk { part, .. } if self.is_timeout() => {
                format!("Uploading part {part} timed out. Please check your connection and try again.")
            }
            Self::Chunk { part, .. } => {
                format!("Uploading part {part} failed. Please try the upload again.")
            }
            Self::Backend(e) => e.user_message(),
            Self::Transfer(vidfuse_transfer::TransferError::InvalidSource(msg)) => msg.clone(),
            other => other.to_string(),
        }
    }
}
