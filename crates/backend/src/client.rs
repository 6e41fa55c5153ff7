//! VidFuse backend API client.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::{debug, info};

use vidfuse_http::{HttpError, HttpRequest, HttpTransport, RetryPolicy, fetch_with_retry};
use vidfuse_protocol::constants::{
    GET_UPLOAD_URL_PATH, HEALTH_PATH, PROCESS_VIDEOS_PATH, PROCESSING_TIMEOUT, YOUTUBE_INFO_PATH,
};
use vidfuse_protocol::{
    ApiErrorBody, HealthReport, ProcessVideosRequest, ProcessVideosResponse, UploadUrlRequest,
    UploadUrlResponse, YoutubeInfo, YoutubeInfoResponse,
};

/// Errors from the backend client.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("API error {status}: {message} (after {attempts} attempts)")]
    Api {
        status: u16,
        message: String,
        attempts: u32,
    },

    #[error("backend rejected request: {0}")]
    Rejected(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl BackendError {
    /// Returns `true` if the failure was a request deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Http(e) if e.is_timeout())
    }

    /// Raw body of the final non-2xx response, if there was one.
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Http(e) => match e.last() {
                HttpError::Status { body, .. } => Some(body.as_str()),
                _ => None,
            },
            _ => None,
        }
    }

    /// Human-readable message suitable for a warning panel.
    pub fn user_message(&self) -> String {
        match self {
            e if e.is_timeout() => {
                "The server took too long to respond. Please try again.".to_string()
            }
            Self::Api { message, .. } | Self::Rejected(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Promotes a failed response carrying a `message`/`error` body to [`BackendError::Api`].
fn classify(err: HttpError) -> BackendError {
    if let HttpError::Status { status, body } = err.last()
        && let Ok(parsed) = serde_json::from_str::<ApiErrorBody>(body)
        && let Some(reason) = parsed.reason()
    {
        return BackendError::Api {
            status: *status,
            message: reason.to_string(),
            attempts: err.attempts(),
        };
    }
    BackendError::Http(err)
}

/// VidFuse backend API client.
#[derive(Clone)]
pub struct BackendClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    policy: RetryPolicy,
}

impl BackendClient {
    /// Creates a client for `base_url` (trailing slashes are ignored).
    pub fn new(base_url: &str, transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            policy,
        }
    }

    /// Transport shared with callers that talk to object storage directly.
    pub fn transport(&self) -> Arc<dyn HttpTransport> {
        Arc::clone(&self.transport)
    }

    /// Retry policy applied to control calls.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sends `request` with retries and decodes a 2xx JSON body.
    async fn call<R: DeserializeOwned>(
        &self,
        request: HttpRequest,
        policy: &RetryPolicy,
    ) -> Result<R, BackendError> {
        let resp = fetch_with_retry(self.transport.as_ref(), &request, policy)
            .await
            .map_err(classify)?;
        Ok(serde_json::from_slice(&resp.body)?)
    }

    /// Requests a presigned URL for uploading `file_name`.
    pub async fn get_upload_url(
        &self,
        file_name: &str,
        file_type: &str,
    ) -> Result<UploadUrlResponse, BackendError> {
        let body = serde_json::to_vec(&UploadUrlRequest {
            file_name: file_name.to_string(),
            file_type: file_type.to_string(),
        })?;
        let request = HttpRequest::post(self.url(GET_UPLOAD_URL_PATH))
            .header("Content-Type", "application/json")
            .body(body);

        let resp: UploadUrlResponse = self.call(request, &self.policy).await?;
        debug!(s3_key = %resp.s3_key, "received presigned upload URL");
        Ok(resp)
    }

    /// Submits an uploaded video and a YouTube reference for fusion.
    ///
    /// Uses the long processing deadline instead of the control deadline.
    pub async fn process_videos(
        &self,
        req: &ProcessVideosRequest,
    ) -> Result<ProcessVideosResponse, BackendError> {
        let request = HttpRequest::post(self.url(PROCESS_VIDEOS_PATH))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(req.to_form_body());
        let policy = self.policy.with_timeout(PROCESSING_TIMEOUT);

        let resp: ProcessVideosResponse = self.call(request, &policy).await?;
        if !resp.is_success() {
            return Err(BackendError::Rejected(if resp.message.is_empty() {
                format!("processing ended with status {:?}", resp.status)
            } else {
                resp.message
            }));
        }

        info!(
            s3_key = %req.personal_video_s3_key,
            video_url = resp.video_url().unwrap_or_default(),
            "fusion request accepted"
        );
        Ok(resp)
    }

    /// Looks up metadata for a YouTube URL.
    pub async fn youtube_info(&self, youtube_url: &str) -> Result<YoutubeInfo, BackendError> {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("url", youtube_url)
            .finish();
        let request = HttpRequest::get(format!("{}?{query}", self.url(YOUTUBE_INFO_PATH)));

        match self.call(request, &self.policy).await? {
            YoutubeInfoResponse::Info(info) => Ok(info),
            YoutubeInfoResponse::Error { error } => Err(BackendError::Rejected(error)),
        }
    }

    /// Fetches the backend health report.
    ///
    /// Any 2xx body is returned as-is, healthy or not; interpreting it is up
    /// to the caller.
    pub async fn health(&self) -> Result<HealthReport, BackendError> {
        self.call(HttpRequest::get(self.url(HEALTH_PATH)), &self.policy)
            .await
    }
}
