use std::time::Duration;

use tracing::warn;

use crate::{HttpError, HttpRequest, HttpResponse, HttpTransport};

/// Sends `request` and fails with [`HttpError::Timeout`] if no response
/// arrives within `deadline`.
///
/// On timeout the in-flight send is dropped, which cancels it. The deadline
/// timer lives inside this call and is gone once it returns, whichever way
/// it completes. Non-2xx responses are returned as `Ok`; classifying them is
/// the caller's concern.
pub async fn fetch_with_timeout<T: HttpTransport + ?Sized>(
    transport: &T,
    request: &HttpRequest,
    deadline: Duration,
) -> Result<HttpResponse, HttpError> {
    match tokio::time::timeout(deadline, transport.send(request)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                method = request.method.as_str(),
                url = %request.url,
                deadline_secs = deadline.as_secs_f64(),
                "request timed out"
            );
            Err(HttpError::Timeout { after: deadline })
        }
    }
}
