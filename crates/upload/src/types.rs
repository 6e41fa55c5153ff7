use std::path::PathBuf;

use vidfuse_protocol::{ProcessVideosResponse, YoutubeInfo};

/// Progress after a part has been accepted by object storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    /// Part that just completed (0 for an empty payload).
    pub part: u32,
    /// Total parts in the upload.
    pub parts: u32,
    pub uploaded_bytes: u64,
    pub total_bytes: u64,
    /// Rounded percentage, 0–100, non-decreasing across one upload.
    pub percent: u8,
}

/// Summary of a finished upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub parts: u32,
    pub bytes: u64,
    /// `ETag` returned for each part, in part order.
    pub etags: Vec<Option<String>>,
}

/// Everything needed to submit one fusion request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FusionJob {
    /// Recorded or selected personal video.
    pub video_path: PathBuf,
    /// Reference YouTube video.
    pub youtube_url: String,
    /// Still image representing the personal video.
    pub thumbnail_path: Option<PathBuf>,
}

/// Result of a completed fusion submission.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionOutcome {
    /// Object-storage key of the uploaded personal video.
    pub s3_key: String,
    pub upload: UploadReport,
    pub response: ProcessVideosResponse,
}

impl FusionOutcome {
    /// Playable URL of the result, whichever variant the backend returned.
    pub fn video_url(&self) -> Option<&str> {
        self.response.video_url()
    }

    pub fn youtube_info(&self) -> Option<&YoutubeInfo> {
        self.response.youtube_info.as_ref()
    }
}

/// Pipeline stage, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    RequestingUploadUrl,
    Uploading,
    Processing,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Validating => "Validating inputs...",
            Self::RequestingUploadUrl => "Preparing upload...",
            Self::Uploading => "Uploading video...",
            Self::Processing => "Processing videos...",
        })
    }
}

/// Event emitted while a fusion job runs.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// A new stage started.
    Stage(Stage),
    /// A part finished uploading.
    Progress(UploadProgress),
    /// The job finished successfully.
    Completed { video_url: Option<String> },
    /// The job failed; `message` is suitable for display.
    Failed { message: String },
}
