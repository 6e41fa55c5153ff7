use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Percentage of `uploaded` over `total`, rounded to the nearest integer.
///
/// Clamped to 0–100. An empty payload is always 100% complete.
pub fn progress_percent(uploaded: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (uploaded.min(total) as f64 / total as f64 * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

/// Monotonic byte counter for a single upload.
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    uploaded: u64,
    total: u64,
}

impl ProgressCounter {
    pub fn new(total: u64) -> Self {
        Self { uploaded: 0, total }
    }

    /// Records `bytes` more as delivered and returns the new percentage.
    pub fn advance(&mut self, bytes: u64) -> u8 {
        self.uploaded = self.uploaded.saturating_add(bytes).min(self.total);
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        progress_percent(self.uploaded, self.total)
    }

    pub fn uploaded(&self) -> u64 {
        self.uploaded
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn remaining(&self) -> u64 {
        self.total - self.uploaded
    }
}

/// Throughput over a sliding time window.
///
/// Only bytes recorded within the last `window` count, so a stall shows up
/// as a falling rate instead of being averaged away.
#[derive(Debug, Clone)]
pub struct TransferRate {
    window: Duration,
    started: Instant,
    samples: VecDeque<(Instant, u64)>,
}

impl Default for TransferRate {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl TransferRate {
    /// Starts measuring now.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            started: Instant::now(),
            samples: VecDeque::new(),
        }
    }

    /// Records `bytes` delivered just now.
    pub fn record(&mut self, bytes: u64) {
        let now = Instant::now();
        self.samples.push_back((now, bytes));
        if let Some(cutoff) = now.checked_sub(self.window) {
            while self.samples.front().is_some_and(|(t, _)| *t < cutoff) {
                self.samples.pop_front();
            }
        }
    }

    /// Average bytes per second within the window; 0 before any progress.
    pub fn bytes_per_second(&self) -> f64 {
        let now = Instant::now();
        let since = now
            .checked_sub(self.window)
            .map_or(self.started, |cutoff| cutoff.max(self.started));
        let elapsed = now.duration_since(since);
        if elapsed.is_zero() {
            return 0.0;
        }
        let bytes: u64 = self
            .samples
            .iter()
            .filter(|(t, _)| *t >= since)
            .map(|(_, b)| b)
            .sum();
        bytes as f64 / elapsed.as_secs_f64()
    }

    /// Time left for `remaining` bytes at the current rate.
    pub fn eta(&self, remaining: u64) -> Option<Duration> {
        let rate = self.bytes_per_second();
        (rate > 0.0).then(|| Duration::from_secs_f64(remaining as f64 / rate))
    }
}
