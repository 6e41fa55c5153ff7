//! Command execution.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use vidfuse_backend::BackendClient;
use vidfuse_health::{HealthPoller, PollerState, poll_once};
use vidfuse_http::ReqwestTransport;
use vidfuse_protocol::{extract_video_id, thumbnail_url};
use vidfuse_upload::{FusionJob, FusionPipeline, PipelineEvent};

use crate::args::{Command, USAGE};
use crate::config::Config;

/// Runs one command to completion.
pub async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    match command {
        Command::Help => {
            println!("{USAGE}");
            Ok(())
        }
        Command::Upload {
            video,
            youtube_url,
            thumbnail,
        } => {
            upload(
                &config,
                FusionJob {
                    video_path: video,
                    youtube_url,
                    thumbnail_path: thumbnail,
                },
            )
            .await
        }
        Command::Info { youtube_url } => youtube_info(&config, &youtube_url).await,
        Command::Health { watch: false } => health_once(&config).await,
        Command::Health { watch: true } => health_watch(&config).await,
    }
}

fn backend_client(config: &Config) -> anyhow::Result<BackendClient> {
    let transport = ReqwestTransport::new().context("failed to build HTTP client")?;
    Ok(BackendClient::new(
        &config.backend_url,
        Arc::new(transport),
        config.retry_policy(),
    ))
}

async fn upload(config: &Config, job: FusionJob) -> anyhow::Result<()> {
    let mut pipeline = FusionPipeline::new(backend_client(config)?, config.chunk_size());
    let Some(mut events) = pipeline.take_events() else {
        anyhow::bail!("pipeline events already taken");
    };

    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            print_event(&event);
        }
    });

    let result = pipeline.run(&job).await;
    drop(pipeline);
    printer.await?;

    let outcome = result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
    if let Some(info) = outcome.youtube_info() {
        println!("Reference: {} ({})", info.title, info.duration);
    }
    match outcome.video_url() {
        Some(url) => println!("Fused video: {url}"),
        None => println!("Submitted as {}", outcome.s3_key),
    }
    Ok(())
}

fn print_event(event: &PipelineEvent) {
    match event {
        PipelineEvent::Stage(stage) => println!("{stage}"),
        PipelineEvent::Progress(p) => {
            println!("  {:>3}%  part {}/{}", p.percent, p.part, p.parts)
        }
        PipelineEvent::Completed { .. } => println!("Done."),
        PipelineEvent::Failed { message } => eprintln!("Error: {message}"),
    }
}

async fn youtube_info(config: &Config, youtube_url: &str) -> anyhow::Result<()> {
    let video_id = extract_video_id(youtube_url)
        .with_context(|| format!("not a recognised YouTube URL: {youtube_url}"))?;

    let client = backend_client(config)?;
    let info = client
        .youtube_info(youtube_url)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    println!("Title:     {}", info.title);
    println!("Duration:  {}", info.duration);
    let thumbnail = if info.thumbnail.is_empty() {
        thumbnail_url(&video_id)
    } else {
        info.thumbnail
    };
    println!("Thumbnail: {thumbnail}");
    Ok(())
}

fn print_health(state: &PollerState) {
    match state.warning() {
        None => println!(
            "Backend healthy (next check in {}s)",
            state.interval.as_secs()
        ),
        Some(warning) => println!(
            "Warning: {warning} (next check in {}s)",
            state.interval.as_secs()
        ),
    }
}

async fn health_once(config: &Config) -> anyhow::Result<()> {
    let state = poll_once(&backend_client(config)?, PollerState::new()).await;
    print_health(&state);
    if !state.is_healthy() {
        anyhow::bail!("backend unhealthy");
    }
    Ok(())
}

async fn health_watch(config: &Config) -> anyhow::Result<()> {
    let mut poller = HealthPoller::new(backend_client(config)?);
    poller.start(Box::new(print_health));

    tokio::signal::ctrl_c().await?;
    info!("interrupted, stopping health watch");
    poller.stop();
    Ok(())
}
