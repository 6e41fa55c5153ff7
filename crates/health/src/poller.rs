//! Background health poller.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vidfuse_backend::BackendClient;

use crate::state::{PollerState, diagnose, diagnose_error};

/// Callback invoked with the state after every check.
pub type StateFn = Box<dyn Fn(&PollerState) + Send + Sync + 'static>;

/// Runs one health check and returns the updated state.
///
/// The request goes through the client's retry policy; only the outcome of
/// the whole retry sequence moves the interval.
pub async fn poll_once(client: &BackendClient, mut state: PollerState) -> PollerState {
    let was_healthy = state.is_healthy();

    match client.health().await {
        Ok(report) if report.is_healthy() => {
            if !was_healthy {
                info!("backend healthy again");
            }
            state.on_success(report);
        }
        Ok(report) => {
            let diagnostic = diagnose(&report);
            state.on_failure(diagnostic, Some(report));
        }
        Err(e) => {
            let (diagnostic, report) = diagnose_error(&e);
            state.on_failure(diagnostic, report);
        }
    }

    match state.warning() {
        Some(warning) => warn!(
            next_check_secs = state.interval.as_secs(),
            "{warning}"
        ),
        None => debug!(next_check_secs = state.interval.as_secs(), "backend healthy"),
    }
    state
}

/// Polls the backend on an adaptive schedule until stopped.
///
/// The loop checks immediately, reports, sleeps for the current interval and
/// repeats. It never ends on its own; [`stop`](Self::stop) or dropping the
/// poller ends it.
pub struct HealthPoller {
    client: BackendClient,
    cancel: Option<CancellationToken>,
}

impl HealthPoller {
    pub fn new(client: BackendClient) -> Self {
        Self {
            client,
            cancel: None,
        }
    }

    /// Starts polling, restarting from a fresh state if already running.
    pub fn start(&mut self, on_update: StateFn) {
        self.stop();

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());

        let client = self.client.clone();
        tokio::spawn(async move {
            poll_loop(client, on_update, cancel).await;
        });

        info!(base_url = self.client.base_url(), "health poller started");
    }

    pub fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
            info!("health poller stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for HealthPoller {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }
}

async fn poll_loop(client: BackendClient, on_update: StateFn, cancel: CancellationToken) {
    let mut state = PollerState::new();

    loop {
        state = tokio::select! {
            _ = cancel.cancelled() => break,
            next = poll_once(&client, state) => next,
        };
        on_update(&state);

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(state.interval) => {}
        }
    }
}
