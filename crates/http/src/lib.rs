//! HTTP plumbing shared by every VidFuse client crate.
//!
//! Requests flow through three layers:
//!
//! 1. **Transport**: [`HttpTransport`] sends one request; [`ReqwestTransport`]
//!    is the production implementation, tests plug in mocks.
//! 2. **Timeout-bounded fetch**: [`fetch_with_timeout`] puts a hard deadline
//!    on a single send.
//! 3. **Retry**: [`fetch_with_retry`] repeats the bounded fetch with
//!    exponential backoff until a 2xx arrives or attempts run out.

mod error;
mod fetch;
mod retry;
mod transport;

pub use error::HttpError;
pub use fetch::fetch_with_timeout;
pub use retry::{
    DEFAULT_INITIAL_BACKOFF, DEFAULT_MAX_ATTEMPTS, RetryPolicy, RetryState, fetch_with_retry,
};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
