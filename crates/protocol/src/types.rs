use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::constants::LOAD_WARNING_THRESHOLD;

// ---------------------------------------------------------------------------
// Upload URL
// ---------------------------------------------------------------------------

/// Body of `POST /get-upload-url`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub file_type: String,
}

/// Presigned destination for a personal video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlResponse {
    pub upload_url: String,
    pub s3_key: String,
}

/// Failure body returned by the backend on non-2xx responses.
///
/// Endpoints disagree on the field name, so both are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiErrorBody {
    /// Returns the human-readable reason, preferring `message`.
    pub fn reason(&self) -> Option<&str> {
        self.message.as_deref().or(self.error.as_deref())
    }
}

// ---------------------------------------------------------------------------
// Fusion
// ---------------------------------------------------------------------------

/// Form fields of `POST /process_videos`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessVideosRequest {
    pub personal_video_s3_key: String,
    /// Thumbnail of the personal video as a `data:` URL.
    pub personal_video_thumbnail: String,
    pub youtube_url: String,
}

impl ProcessVideosRequest {
    /// Encodes the request as an `application/x-www-form-urlencoded` body.
    pub fn to_form_body(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("personal_video_s3_key", &self.personal_video_s3_key)
            .append_pair("personal_video_thumbnail", &self.personal_video_thumbnail)
            .append_pair("youtube_url", &self.youtube_url)
            .finish()
    }
}

/// Gallery entry returned by backends that persist fused results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedVideo {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_url: Option<String>,
}

/// Response of `POST /process_videos`.
///
/// Backend revisions return the resulting video under different keys; each
/// variant is kept as an independent optional field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessVideosResponse {
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fused_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_video_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fused_video: Option<FusedVideo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personal_video_thumbnail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube_info: Option<YoutubeInfo>,
}

impl ProcessVideosResponse {
    /// Returns `true` if the backend reported `status: "success"`.
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    /// Playable URL of the result, whichever variant the backend sent.
    pub fn video_url(&self) -> Option<&str> {
        self.fused_video_url
            .as_deref()
            .or(self.fused_video.as_ref().map(|v| v.url.as_str()))
            .or(self.uploaded_video_url.as_deref())
    }
}

// ---------------------------------------------------------------------------
// YouTube info
// ---------------------------------------------------------------------------

/// Duration as reported by the backend: seconds, or free text such as `"Unknown"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YoutubeDuration {
    Seconds(f64),
    Text(String),
}

impl std::fmt::Display for YoutubeDuration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Seconds(secs) => f.write_str(&crate::format_duration(*secs)),
            Self::Text(text) => f.write_str(text),
        }
    }
}

/// Metadata of a reference YouTube video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YoutubeInfo {
    pub title: String,
    pub duration: YoutubeDuration,
    pub thumbnail: String,
}

/// Response of `GET /get_youtube_info`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum YoutubeInfoResponse {
    Info(YoutubeInfo),
    Error { error: String },
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

/// Body of `GET /api/health`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthReport {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s3_status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_usage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_usage: Option<f64>,
}

impl HealthReport {
    /// Only `status == "healthy"` counts as healthy.
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }

    /// `true` if the storage service reported anything other than an OK state.
    pub fn storage_failed(&self) -> bool {
        match self.s3_status.as_deref() {
            None => false,
            Some(s) => !matches!(
                s.to_ascii_lowercase().as_str(),
                "ok" | "healthy" | "connected"
            ),
        }
    }

    /// `true` if CPU usage is above [`LOAD_WARNING_THRESHOLD`].
    pub fn cpu_overloaded(&self) -> bool {
        self.cpu_usage.is_some_and(|v| v > LOAD_WARNING_THRESHOLD)
    }

    /// `true` if memory usage is above [`LOAD_WARNING_THRESHOLD`].
    pub fn memory_overloaded(&self) -> bool {
        self.memory_usage.is_some_and(|v| v > LOAD_WARNING_THRESHOLD)
    }
}

/// Builds a `data:` URL embedding `bytes` as base64.
pub fn data_url(content_type: &str, bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:{content_type};base64,{encoded}")
}
