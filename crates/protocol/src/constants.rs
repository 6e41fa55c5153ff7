use std::time::Duration;

/// Requests a presigned object-storage URL for a new upload.
pub const GET_UPLOAD_URL_PATH: &str = "/get-upload-url";

/// Submits an uploaded video and a YouTube reference for fusion.
pub const PROCESS_VIDEOS_PATH: &str = "/process_videos";

/// Looks up title, duration and thumbnail for a YouTube URL.
pub const YOUTUBE_INFO_PATH: &str = "/get_youtube_info";

/// Backend health probe.
pub const HEALTH_PATH: &str = "/api/health";

/// Deadline for control calls (presign, info, health, chunk PUTs).
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(30);

/// Deadline for the long-running fusion call.
pub const PROCESSING_TIMEOUT: Duration = Duration::from_secs(300);

/// Health poll interval while the backend is healthy.
pub const HEALTH_MIN_INTERVAL: Duration = Duration::from_secs(30);

/// Upper bound for the health poll interval while degraded.
pub const HEALTH_MAX_INTERVAL: Duration = Duration::from_secs(300);

/// CPU or memory usage (percent) above which the backend is reported as overloaded.
pub const LOAD_WARNING_THRESHOLD: f64 = 90.0;

/// Header carrying the 1-based multipart part number.
pub const PART_NUMBER_HEADER: &str = "x-amz-part-number";

/// Header carrying the hex SHA-256 of the chunk body.
pub const CONTENT_SHA256_HEADER: &str = "x-amz-content-sha256";
