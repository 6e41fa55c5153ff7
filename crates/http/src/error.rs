use std::time::Duration;

/// Errors produced while talking to a remote endpoint.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    #[error("request timed out after {}s", .after.as_secs_f64())]
    Timeout { after: Duration },

    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{source} (gave up after {attempts} attempts)")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<HttpError>,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl HttpError {
    /// Returns `true` if a deadline was exceeded anywhere in the chain.
    pub fn is_timeout(&self) -> bool {
        matches!(self.last(), Self::Timeout { .. })
    }

    /// HTTP status of the final failure, if it was a non-2xx response.
    pub fn status(&self) -> Option<u16> {
        match self.last() {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The failure of the last attempt, unwrapping retry context.
    pub fn last(&self) -> &HttpError {
        match self {
            Self::Exhausted { source, .. } => source.last(),
            other => other,
        }
    }

    /// Owned version of [`last`](Self::last).
    pub fn into_last(self) -> HttpError {
        match self {
            Self::Exhausted { source, .. } => source.into_last(),
            other => other,
        }
    }

    /// Number of attempts made before this error surfaced (1 without retries).
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } => *attempts,
            _ => 1,
        }
    }
}

impl From<reqwest::Error> for HttpError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Self::InvalidRequest(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}
