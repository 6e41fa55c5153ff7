use std::time::Duration;

use vidfuse_backend::BackendError;
use vidfuse_protocol::HealthReport;
use vidfuse_protocol::constants::{HEALTH_MAX_INTERVAL, HEALTH_MIN_INTERVAL};

/// Interval that follows a failed check at `current`.
pub fn next_interval(current: Duration) -> Duration {
    current.saturating_mul(2).min(HEALTH_MAX_INTERVAL)
}

/// Outcome of the most recent check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    /// Backend unhealthy or unreachable; carries a message for display.
    Degraded(String),
}

/// Everything that survives between two health checks.
#[derive(Debug, Clone, PartialEq)]
pub struct PollerState {
    /// Delay before the next check.
    pub interval: Duration,
    pub status: HealthStatus,
    /// Last report the backend returned, if any was parseable.
    pub last_report: Option<HealthReport>,
}

impl Default for PollerState {
    fn default() -> Self {
        Self::new()
    }
}

impl PollerState {
    pub fn new() -> Self {
        Self {
            interval: HEALTH_MIN_INTERVAL,
            status: HealthStatus::Healthy,
            last_report: None,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }

    /// Warning to display, `None` while healthy.
    pub fn warning(&self) -> Option<&str> {
        match &self.status {
            HealthStatus::Healthy => None,
            HealthStatus::Degraded(msg) => Some(msg),
        }
    }

    /// Records a healthy check: interval back to the floor, warning cleared.
    pub fn on_success(&mut self, report: HealthReport) {
        self.interval = HEALTH_MIN_INTERVAL;
        self.status = HealthStatus::Healthy;
        self.last_report = Some(report);
    }

    /// Records an unhealthy check: interval doubles up to the ceiling.
    pub fn on_failure(&mut self, diagnostic: String, report: Option<HealthReport>) {
        self.interval = next_interval(self.interval);
        self.status = HealthStatus::Degraded(diagnostic);
        if report.is_some() {
            self.last_report = report;
        }
    }
}

/// Human-readable explanation of an unhealthy report.
pub fn diagnose(report: &HealthReport) -> String {
    let mut problems = Vec::new();
    if report.storage_failed() {
        problems.push(format!(
            "storage service unavailable ({})",
            report.s3_status.as_deref().unwrap_or_default()
        ));
    }
    if report.cpu_overloaded() {
        problems.push(format!(
            "high CPU load ({:.0}%)",
            report.cpu_usage.unwrap_or_default()
        ));
    }
    if report.memory_overloaded() {
        problems.push(format!(
            "high memory usage ({:.0}%)",
            report.memory_usage.unwrap_or_default()
        ));
    }

    if problems.is_empty() {
        format!("Backend reported status \"{}\"", report.status)
    } else {
        format!("Backend degraded: {}", problems.join(", "))
    }
}

/// Diagnostic for a failed health request.
///
/// Failure responses often still carry a health body; when one parses it is
/// diagnosed like any other report, otherwise the error text is used as-is.
pub fn diagnose_error(err: &BackendError) -> (String, Option<HealthReport>) {
    if let Some(body) = err.response_body()
        && let Ok(report) = serde_json::from_str::<HealthReport>(body)
    {
        let diagnostic = diagnose(&report);
        return (diagnostic, Some(report));
    }
    (err.to_string(), None)
}
