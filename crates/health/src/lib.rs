//! Backend health polling with an adaptive interval.
//!
//! The interval starts at 30 s, doubles after every unhealthy check up to
//! 300 s, and drops back to 30 s on the first healthy one.

mod poller;
mod state;

pub use poller::{HealthPoller, StateFn, poll_once};
pub use state::{HealthStatus, PollerState, diagnose, diagnose_error, next_interval};
