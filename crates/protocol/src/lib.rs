//! Wire types and constants for the VidFuse backend API.
//!
//! Every request and response body exchanged with the backend lives here,
//! together with the paths, timeouts and health thresholds the client
//! crates agree on.

pub mod constants;
pub mod types;
pub mod youtube;

// Re-export primary types for convenience.
pub use types::{
    ApiErrorBody, FusedVideo, HealthReport, ProcessVideosRequest, ProcessVideosResponse,
    UploadUrlRequest, UploadUrlResponse, YoutubeDuration, YoutubeInfo, YoutubeInfoResponse,
    data_url,
};
pub use youtube::{extract_video_id, format_duration, thumbnail_url};
