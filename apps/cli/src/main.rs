//! VidFuse command-line client entry point.

mod app;
mod args;
mod config;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Logs go to stderr so command output stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let command = args::parse(std::env::args().skip(1))?;

    let config = config::Config::load()?;
    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        backend_url = %config.backend_url,
        "configuration loaded"
    );

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(app::run(command, config))
}
