//! Sequential multipart upload to a presigned object-storage URL.

use std::sync::Arc;

use tracing::{debug, error, info};

use vidfuse_http::{HttpRequest, HttpTransport, RetryPolicy, fetch_with_retry};
use vidfuse_protocol::constants::{CONTENT_SHA256_HEADER, PART_NUMBER_HEADER};
use vidfuse_transfer::{ChunkReader, ProgressCounter, TransferRate, UploadTask, sha256_hex};

use crate::error::UploadError;
use crate::types::{UploadProgress, UploadReport};

/// Uploads a file part by part, each part through the retrying fetch.
///
/// Parts go out strictly in order: part N is only sent after part N-1 was
/// accepted, so reported progress never goes backwards.
pub struct ChunkedUploader {
    transport: Arc<dyn HttpTransport>,
    policy: RetryPolicy,
}

impl ChunkedUploader {
    pub fn new(transport: Arc<dyn HttpTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Uploads `task`, calling `on_progress` after every accepted part.
    ///
    /// An empty payload issues no requests and reports 100% once. The first
    /// part that exhausts its retries aborts the upload with
    /// [`UploadError::Chunk`]; nothing is resumed.
    pub async fn upload<F>(
        &self,
        task: &UploadTask,
        mut on_progress: F,
    ) -> Result<UploadReport, UploadError>
    where
        F: FnMut(UploadProgress) + Send,
    {
        let parts = u32::try_from(task.chunk_count()).map_err(|_| {
            UploadError::Validation(format!(
                "file too large: {} bytes in {}-byte parts",
                task.total_size, task.chunk_size
            ))
        })?;

        if task.total_size == 0 {
            info!(path = %task.path.display(), "empty payload, nothing to upload");
            on_progress(UploadProgress {
                part: 0,
                parts: 0,
                uploaded_bytes: 0,
                total_bytes: 0,
                percent: 100,
            });
            return Ok(UploadReport {
                parts: 0,
                bytes: 0,
                etags: Vec::new(),
            });
        }

        let mut reader = tokio::task::spawn_blocking({
            let path = task.path.clone();
            move || ChunkReader::open(&path)
        })
        .await??;

        let mut counter = ProgressCounter::new(task.total_size);
        let mut rate = TransferRate::default();
        let mut etags = Vec::with_capacity(parts as usize);

        debug!(
            path = %task.path.display(),
            total_bytes = task.total_size,
            chunk_size = task.chunk_size,
            parts,
            "starting chunked upload"
        );

        for chunk in task.chunks() {
            let (r, data) = tokio::task::spawn_blocking(move || {
                let data = reader.read_chunk(&chunk);
                (reader, data)
            })
            .await?;
            reader = r;
            let data = data?;

            let request = HttpRequest::put(&task.destination)
                .header("Content-Type", &task.content_type)
                .header("Content-Range", chunk.content_range(task.total_size))
                .header(PART_NUMBER_HEADER, chunk.part_number.to_string())
                .header(CONTENT_SHA256_HEADER, sha256_hex(&data))
                .body(data);

            let resp = fetch_with_retry(self.transport.as_ref(), &request, &self.policy)
                .await
                .map_err(|e| {
                    error!(
                        part = chunk.part_number,
                        parts,
                        attempts = e.attempts(),
                        error = %e,
                        "part upload failed, aborting"
                    );
                    UploadError::Chunk {
                        part: chunk.part_number,
                        attempts: e.attempts(),
                        source: e.into_last(),
                    }
                })?;

            etags.push(resp.header("etag").map(str::to_string));
            let percent = counter.advance(chunk.len());
            rate.record(chunk.len());

            debug!(
                part = chunk.part_number,
                parts,
                percent,
                range = %chunk.content_range(task.total_size),
                eta_secs = rate.eta(counter.remaining()).map(|d| d.as_secs()),
                "part uploaded"
            );

            on_progress(UploadProgress {
                part: chunk.part_number,
                parts,
                uploaded_bytes: counter.uploaded(),
                total_bytes: counter.total(),
                percent,
            });
        }

        info!(
            path = %task.path.display(),
            bytes = task.total_size,
            parts,
            bytes_per_sec = format_args!("{:.0}", rate.bytes_per_second()),
            "upload complete"
        );

        Ok(UploadReport {
            parts,
            bytes: task.total_size,
            etags,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::path::Path;
    use std::pin::Pin;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;
    use vidfuse_http::{HttpError, HttpResponse, Method};

    const MIB: u64 = 1024 * 1024;

    /// Accepts every PUT except those for parts listed in `fail_parts`,
    /// which fail `fail_times` times each (u32::MAX for always).
    struct StorageMock {
        requests: Mutex<Vec<HttpRequest>>,
        fail_parts: Vec<u32>,
        fail_times: u32,
        failures: Mutex<u32>,
    }

    impl StorageMock {
        fn new() -> Arc<Self> {
            Self::failing(Vec::new(), 0)
        }

        fn failing(fail_parts: Vec<u32>, fail_times: u32) -> Arc<Self> {
            Arc::new(Self {
                requests: Mutex::new(Vec::new()),
                fail_parts,
                fail_times,
                failures: Mutex::new(0),
            })
        }

        fn requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl HttpTransport for StorageMock {
        fn send<'a>(
            &'a self,
            request: &'a HttpRequest,
        ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
            Box::pin(async move {
                self.requests.lock().unwrap().push(request.clone());
                let part: u32 = request
                    .header_value(PART_NUMBER_HEADER)
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(0);

                if self.fail_parts.contains(&part) {
                    let mut failures = self.failures.lock().unwrap();
                    if *failures < self.fail_times {
                        *failures += 1;
                        return Ok(HttpResponse::new(500, "InternalError"));
                    }
                }

                let mut resp = HttpResponse::new(200, "");
                resp.headers.push(("ETag".into(), format!("\"etag-{part}\"")));
                Ok(resp)
            })
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            initial_backoff: Duration::from_millis(1),
            ..Default::default()
        }
    }

    fn write_file(dir: &Path, size: u64) -> std::path::PathBuf {
        let path = dir.join("clip.webm");
        let data: Vec<u8> = (0..size).map(|i| (i % 251) as u8).collect();
        std::fs::write(&path, data).unwrap();
        path
    }

    async fn run(
        transport: Arc<StorageMock>,
        task: &UploadTask,
    ) -> (Result<UploadReport, UploadError>, Vec<UploadProgress>) {
        let uploader = ChunkedUploader::new(transport, fast_policy());
        let mut events = Vec::new();
        let result = uploader.upload(task, |p| events.push(p)).await;
        (result, events)
    }

    #[tokio::test]
    async fn twelve_mib_upload_issues_three_ranged_puts() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), 12 * MIB);
        let task = UploadTask::from_file(&path, "https://s3.test/bucket/key?sig=x", 5 * MIB).unwrap();
        let storage = StorageMock::new();

        let (result, events) = run(storage.clone(), &task).await;
        let report = result.unwrap();

        let reqs = storage.requests();
        assert_eq!(reqs.len(), 3);
        let ranges: Vec<_> = reqs
            .iter()
            .map(|r| r.header_value("Content-Range").unwrap().to_string())
            .collect();
        assert_eq!(
            ranges,
            [
                "bytes 0-5242879/12582912",
                "bytes 5242880-10485759/12582912",
                "bytes 10485760-12582911/12582912",
            ]
        );
        let part_numbers: Vec<_> = reqs
            .iter()
            .map(|r| r.header_value(PART_NUMBER_HEADER).unwrap().to_string())
            .collect();
        assert_eq!(part_numbers, ["1", "2", "3"]);

        for r in &reqs {
            assert_eq!(r.method, Method::Put);
            assert_eq!(r.url, "https://s3.test/bucket/key?sig=x");
            assert_eq!(r.header_value("Content-Type"), Some("video/webm"));
            assert_eq!(
                r.header_value(CONTENT_SHA256_HEADER),
                Some(sha256_hex(&r.body).as_str())
            );
        }
        assert_eq!(reqs[2].body.len() as u64, 2 * MIB);

        let percents: Vec<_> = events.iter().map(|e| e.percent).collect();
        assert_eq!(percents, [42, 83, 100]);
        assert_eq!(events[2].uploaded_bytes, 12 * MIB);

        assert_eq!(report.parts, 3);
        assert_eq!(report.bytes, 12 * MIB);
        assert_eq!(report.etags[1].as_deref(), Some("\"etag-2\""));
    }

    #[tokio::test]
    async fn body_bytes_reassemble_the_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), 1000);
        let task = UploadTask::from_file(&path, "u", 300).unwrap();
        let storage = StorageMock::new();

        let (result, events) = run(storage.clone(), &task).await;
        result.unwrap();

        let joined: Vec<u8> = storage.requests().into_iter().flat_map(|r| r.body).collect();
        assert_eq!(joined, std::fs::read(&path).unwrap());

        let percents: Vec<_> = events.iter().map(|e| e.percent).collect();
        assert!(percents.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(percents.last(), Some(&100));
    }

    #[tokio::test]
    async fn empty_file_reports_complete_without_requests() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), 0);
        let task = UploadTask::from_file(&path, "u", 5 * MIB).unwrap();
        let storage = StorageMock::new();

        let (result, events) = run(storage.clone(), &task).await;
        let report = result.unwrap();

        assert!(storage.requests().is_empty());
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].percent, 100);
        assert_eq!(report.parts, 0);
    }

    #[tokio::test]
    async fn transient_part_failure_is_retried() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), 250);
        let task = UploadTask::from_file(&path, "u", 100).unwrap();
        let storage = StorageMock::failing(vec![2], 1);

        let (result, events) = run(storage.clone(), &task).await;
        assert_eq!(result.unwrap().parts, 3);

        let parts: Vec<_> = storage
            .requests()
            .iter()
            .map(|r| r.header_value(PART_NUMBER_HEADER).unwrap().to_string())
            .collect();
        assert_eq!(parts, ["1", "2", "2", "3"]);
        assert_eq!(events.len(), 3);
    }

    #[tokio::test]
    async fn exhausted_part_aborts_the_upload() {
        let dir = TempDir::new().unwrap();
        let path = write_file(dir.path(), 250);
        let task = UploadTask::from_file(&path, "u", 100).unwrap();
        let storage = StorageMock::failing(vec![2], u32::MAX);

        let (result, events) = run(storage.clone(), &task).await;
        match result.unwrap_err() {
            UploadError::Chunk {
                part,
                attempts,
                source,
            } => {
                assert_eq!(part, 2);
                assert_eq!(attempts, 3);
                assert_eq!(source.status(), Some(500));
            }
            other => panic!("unexpected {other:?}"),
        }

        // Part 3 never went out; only part 1 reported progress.
        let reqs = storage.requests();
        assert_eq!(reqs.len(), 1 + 3);
        assert!(reqs.iter().all(|r| r.header_value(PART_NUMBER_HEADER) != Some("3")));
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].part, 1);
    }
}
