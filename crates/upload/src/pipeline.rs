//! End-to-end fusion submission.
//!
//! Validates the inputs, presigns, uploads the personal video in parts and
//! submits the processing request, reporting stages and progress as events.

use tokio::sync::mpsc;
use tracing::{debug, error, info};

use vidfuse_backend::BackendClient;
use vidfuse_protocol::{ProcessVideosRequest, data_url, extract_video_id};
use vidfuse_transfer::{
    TransferError, UploadTask, file_name, guess_content_type, validate_upload_source,
};

use crate::error::UploadError;
use crate::types::{FusionJob, FusionOutcome, PipelineEvent, Stage};
use crate::uploader::ChunkedUploader;

/// Inputs that passed validation.
struct Validated {
    file_name: String,
    content_type: &'static str,
    youtube_url: String,
    thumbnail: String,
}

/// Runs fusion jobs against one backend.
pub struct FusionPipeline {
    backend: BackendClient,
    uploader: ChunkedUploader,
    chunk_size: u64,
    events_tx: mpsc::UnboundedSender<PipelineEvent>,
    events_rx: Option<mpsc::UnboundedReceiver<PipelineEvent>>,
}

impl FusionPipeline {
    /// Creates a pipeline uploading in `chunk_size` parts (0 selects 5 MiB).
    ///
    /// Part uploads share the backend's transport and retry policy. Events
    /// are buffered until the receiver drains them; none are dropped.
    pub fn new(backend: BackendClient, chunk_size: u64) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let uploader = ChunkedUploader::new(backend.transport(), *backend.policy());
        Self {
            backend,
            uploader,
            chunk_size,
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::UnboundedReceiver<PipelineEvent>> {
        self.events_rx.take()
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    /// Runs one job to completion.
    ///
    /// Ends with exactly one [`PipelineEvent::Completed`] or
    /// [`PipelineEvent::Failed`]. Validation failures are reported before any
    /// request goes out.
    pub async fn run(&self, job: &FusionJob) -> Result<FusionOutcome, UploadError> {
        match self.run_inner(job).await {
            Ok(outcome) => {
                info!(
                    s3_key = %outcome.s3_key,
                    parts = outcome.upload.parts,
                    video_url = outcome.video_url().unwrap_or_default(),
                    "fusion job completed"
                );
                self.emit(PipelineEvent::Completed {
                    video_url: outcome.video_url().map(str::to_string),
                });
                Ok(outcome)
            }
            Err(e) => {
                error!(error = %e, "fusion job failed");
                self.emit(PipelineEvent::Failed {
                    message: e.user_message(),
                });
                Err(e)
            }
        }
    }

    async fn run_inner(&self, job: &FusionJob) -> Result<FusionOutcome, UploadError> {
        self.emit(PipelineEvent::Stage(Stage::Validating));
        let input = validate(job).await?;

        self.emit(PipelineEvent::Stage(Stage::RequestingUploadUrl));
        let presigned = self
            .backend
            .get_upload_url(&input.file_name, input.content_type)
            .await?;

        self.emit(PipelineEvent::Stage(Stage::Uploading));
        let task = UploadTask::from_file(&job.video_path, presigned.upload_url, self.chunk_size)?;
        let progress_tx = self.events_tx.clone();
        let upload = self
            .uploader
            .upload(&task, move |p| {
                // Only fails once the receiver is gone.
                let _ = progress_tx.send(PipelineEvent::Progress(p));
            })
            .await?;

        self.emit(PipelineEvent::Stage(Stage::Processing));
        let response = self
            .backend
            .process_videos(&ProcessVideosRequest {
                personal_video_s3_key: presigned.s3_key.clone(),
                personal_video_thumbnail: input.thumbnail,
                youtube_url: input.youtube_url,
            })
            .await?;

        Ok(FusionOutcome {
            s3_key: presigned.s3_key,
            upload,
            response,
        })
    }

    fn emit(&self, event: PipelineEvent) {
        if self.events_tx.send(event).is_err() {
            debug!("pipeline event receiver dropped");
        }
    }
}

async fn validate(job: &FusionJob) -> Result<Validated, UploadError> {
    validate_upload_source(&job.video_path).map_err(|e| match e {
        TransferError::InvalidSource(msg) if job.video_path.as_os_str().is_empty() => {
            UploadError::Validation(format!("Please select a personal video ({msg})"))
        }
        TransferError::InvalidSource(msg) => UploadError::Validation(msg),
        other => other.into(),
    })?;

    let youtube_url = job.youtube_url.trim();
    if youtube_url.is_empty() {
        return Err(UploadError::Validation("Please enter a YouTube URL".into()));
    }
    if extract_video_id(youtube_url).is_none() {
        return Err(UploadError::Validation(format!(
            "Not a recognised YouTube URL: {youtube_url}"
        )));
    }

    let Some(thumbnail_path) = job.thumbnail_path.as_deref() else {
        return Err(UploadError::Validation(
            "A thumbnail of the personal video is required".into(),
        ));
    };
    let thumbnail_type = guess_content_type(thumbnail_path);
    if !thumbnail_type.starts_with("image/") {
        return Err(UploadError::Validation(format!(
            "Thumbnail must be an image: {}",
            thumbnail_path.display()
        )));
    }
    let thumbnail_bytes = tokio::fs::read(thumbnail_path).await?;

    let file_name = file_name(&job.video_path)
        .ok_or_else(|| UploadError::Validation("Personal video has no file name".into()))?
        .to_string();

    Ok(Validated {
        file_name,
        content_type: guess_content_type(&job.video_path),
        youtube_url: youtube_url.to_string(),
        thumbnail: data_url(thumbnail_type, &thumbnail_bytes),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::path::{Path, PathBuf};
    use std::pin::Pin;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tempfile::TempDir;
    use vidfuse_http::{
        HttpError, HttpRequest, HttpResponse, HttpTransport, Method, RetryPolicy,
    };

    const YOUTUBE: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
    const PRESIGNED: &str = "https://bucket.s3.test/uploads/clip.mp4?X-Amz-Signature=abc";

    /// Routes requests to canned backend and storage responses.
    struct BackendMock {
        requests: Mutex<Vec<HttpRequest>>,
        process_status: u16,
        process_body: String,
    }

    impl BackendMock {
        fn new() -> Arc<Self> {
            Self::with_process(
                200,
                serde_json::json!({
                    "status": "success",
                    "message": "Videos processed",
                    "fused_video_url": "https://cdn.test/fused.mp4",
                    "youtube_info": { "title": "Song", "duration": 212, "thumbnail": "t.jpg" }
                })
                .to_string(),
            )
        }

        fn with_process(status: u16, body: String) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                process_status: status,
                process_body: body,
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpTransport for BackendMock {
        fn send<'a>(
            &'a self,
            request: &'a HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request.clone());
                let resp = if request.url.ends_with("/get-upload-url") {
                    HttpResponse::new(
                        200,
                        serde_json::json!({
                            "uploadUrl": PRESIGNED,
                            "s3Key": "uploads/clip.mp4"
                        })
                        .to_string(),
                    )
                } else if request.url.ends_with("/process_videos") {
                    HttpResponse::new(self.process_status, self.process_body.clone())
                } else if request.url == PRESIGNED {
                    HttpResponse::new(200, "")
                } else {
                    HttpResponse::new(404, "not found")
                };
                Ok(resp)
            })
        }
    }

    fn pipeline(transport: Arc<BackendMock>, chunk_size: u64) -> FusionPipeline {
        let policy = RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        };
        FusionPipeline::new(
            BackendClient::new("https://api.test/", transport, policy),
            chunk_size,
        )
    }

    fn fixture(dir: &Path, video_len: usize) -> FusionJob {
        let video = dir.join("clip.mp4");
        std::fs::write(&video, vec![7u8; video_len]).unwrap();
        let thumb = dir.join("thumb.png");
        std::fs::write(&thumb, b"png").unwrap();
        FusionJob {
            video_path: video,
            youtube_url: YOUTUBE.into(),
            thumbnail_path: Some(thumb),
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<PipelineEvent>) -> Vec<PipelineEvent> {
        let mut events = Vec::new();
        while let Ok(e) = rx.try_recv() {
            events.push(e);
        }
        events
    }

    #[tokio::test]
    async fn full_run_presigns_uploads_and_processes() {
        let dir = TempDir::new().unwrap();
        let job = fixture(dir.path(), 250);
        let mock = BackendMock::new();
        let mut pipeline = pipeline(mock.clone(), 100);
        let mut rx = pipeline.take_events().unwrap();

        let outcome = pipeline.run(&job).await.unwrap();
        assert_eq!(outcome.s3_key, "uploads/clip.mp4");
        assert_eq!(outcome.upload.parts, 3);
        assert_eq!(outcome.video_url(), Some("https://cdn.test/fused.mp4"));
        assert_eq!(outcome.youtube_info().unwrap().title, "Song");

        let reqs = mock.requests();
        assert_eq!(reqs.len(), 5);
        assert_eq!(reqs[0].url, "https://api.test/get-upload-url");
        let presign: serde_json::Value = serde_json::from_slice(&reqs[0].body).unwrap();
        assert_eq!(presign["fileName"], "clip.mp4");
        assert_eq!(presign["fileType"], "video/mp4");
        assert!(reqs[1..4].iter().all(|r| r.method == Method::Put));

        let process = String::from_utf8(reqs[4].body.clone()).unwrap();
        assert!(process.contains("personal_video_s3_key=uploads%2Fclip.mp4"));
        assert!(process.contains("personal_video_thumbnail=data%3Aimage%2Fpng%3Bbase64%2CcG5n"));
        assert!(process.contains("youtube_url=https%3A%2F%2Fwww.youtube.com"));

        let events = drain(&mut rx);
        let stages: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Stage(s) => Some(*s),
                _ => None,
            })
            .collect();
        assert_eq!(
            stages,
            [
                Stage::Validating,
                Stage::RequestingUploadUrl,
                Stage::Uploading,
                Stage::Processing
            ]
        );
        let percents: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Progress(p) => Some(p.percent),
                _ => None,
            })
            .collect();
        assert_eq!(percents, [40, 80, 100]);
        assert_eq!(
            events.last(),
            Some(&PipelineEvent::Completed {
                video_url: Some("https://cdn.test/fused.mp4".into())
            })
        );
    }

    async fn expect_validation(job: FusionJob, needle: &str) {
        let mock = BackendMock::new();
        let mut pipeline = pipeline(mock.clone(), 100);
        let mut rx = pipeline.take_events().unwrap();

        match pipeline.run(&job).await.unwrap_err() {
            UploadError::Validation(msg) => assert!(msg.contains(needle), "{msg}"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(mock.requests().is_empty());
        assert!(matches!(
            drain(&mut rx).last(),
            Some(PipelineEvent::Failed { .. })
        ));
    }

    #[tokio::test]
    async fn missing_video_is_rejected_before_any_request() {
        let dir = TempDir::new().unwrap();
        let mut job = fixture(dir.path(), 10);
        job.video_path = PathBuf::new();
        expect_validation(job, "Please select a personal video").await;
    }

    #[tokio::test]
    async fn blank_youtube_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut job = fixture(dir.path(), 10);
        job.youtube_url = "   ".into();
        expect_validation(job, "Please enter a YouTube URL").await;
    }

    #[tokio::test]
    async fn non_youtube_url_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut job = fixture(dir.path(), 10);
        job.youtube_url = "https://vimeo.com/12345".into();
        expect_validation(job, "Not a recognised YouTube URL").await;
    }

    #[tokio::test]
    async fn missing_thumbnail_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut job = fixture(dir.path(), 10);
        job.thumbnail_path = None;
        expect_validation(job, "thumbnail").await;
    }

    #[tokio::test]
    async fn non_image_thumbnail_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut job = fixture(dir.path(), 10);
        job.thumbnail_path = Some(job.video_path.clone());
        expect_validation(job, "Thumbnail must be an image").await;
    }

    #[tokio::test]
    async fn processing_error_surfaces_backend_message() {
        let dir = TempDir::new().unwrap();
        let job = fixture(dir.path(), 10);
        let mock = BackendMock::with_process(
            500,
            serde_json::json!({ "message": "ffmpeg crashed" }).to_string(),
        );
        let mut pipeline = pipeline(mock.clone(), 100);
        let mut rx = pipeline.take_events().unwrap();

        let err = pipeline.run(&job).await.unwrap_err();
        assert!(matches!(err, UploadError::Backend(_)));
        assert!(err.user_message().contains("ffmpeg crashed"));

        // Presign, one part, then three processing attempts.
        assert_eq!(mock.requests().len(), 1 + 1 + 3);
        assert_eq!(
            drain(&mut rx).last(),
            Some(&PipelineEvent::Failed {
                message: err.user_message()
            })
        );
    }

    #[tokio::test]
    async fn late_receiver_still_sees_every_event() {
        let dir = TempDir::new().unwrap();
        let job = fixture(dir.path(), 300);
        let mut pipeline = pipeline(BackendMock::new(), 1);
        let mut rx = pipeline.take_events().unwrap();

        // Nothing drains the channel while the 300-part upload runs.
        pipeline.run(&job).await.unwrap();

        let events = drain(&mut rx);
        let progress: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                PipelineEvent::Progress(p) => Some(*p),
                _ => None,
            })
            .collect();
        assert_eq!(progress.len(), 300);
        assert_eq!(progress.last().map(|p| (p.part, p.percent)), Some((300, 100)));
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::Completed { .. })
        ));
    }

    #[tokio::test]
    async fn events_are_optional() {
        let dir = TempDir::new().unwrap();
        let job = fixture(dir.path(), 10);
        let pipeline = pipeline(BackendMock::new(), 0);
        assert_eq!(pipeline.run(&job).await.unwrap().upload.parts, 1);
    }
}
