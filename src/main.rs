//! air-guitar-daemon: hand-landmark frames in, guitar control signals out
//!
//! This daemon hosts the gesture pipeline and provides:
//! - Finger classification, smoothing and hand side resolution
//! - Fretboard mapping, fist-driven recording control and wrist volume
//! - Strum detection and edge-triggered note playback
//! - IPC server for frame submission, status and per-frame notifications
//!
//! Camera capture and landmark extraction happen elsewhere; frames arrive
//! over IPC or from a recorded JSON-lines file.

mod config;
mod events;
mod feed;
mod hand;
mod ipc;
mod lifecycle;
mod mapping;
mod pipeline;
mod playback;
mod state;

use std::time::Duration;

use anyhow::Result;
use tokio::sync::{broadcast, mpsc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::feed::ReplayFeed;
use crate::ipc::Server;
use crate::lifecycle::ShutdownSignal;
use crate::pipeline::{runner, FrameReport, Pipeline};
use crate::playback::SampleLibrary;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "air-guitar-daemon starting"
    );

    // Load configuration
    let config = Config::load()?;
    config.ensure_dirs()?;
    info!(
        ?config.socket_path,
        ?config.samples_dir,
        classifier = ?config.pipeline.classifier_strategy,
        fret_scheme = ?config.pipeline.fret_scheme,
        fist_rule = ?config.pipeline.control.fist_rule,
        "configuration loaded"
    );

    // Create shutdown signal handler
    let shutdown = ShutdownSignal::new();

    // Create channels for inter-component communication
    // Frame sources -> pipeline runner
    let (command_tx, command_rx) = mpsc::channel(64);
    // Pipeline runner -> IPC subscribers and status
    let (report_tx, _report_rx) = broadcast::channel::<FrameReport>(256);

    // The runner owns the pipeline and the audio boundary
    let pipeline = Pipeline::new(&config.pipeline);
    let audio = SampleLibrary::scan(&config.samples_dir);
    let runner_handle = tokio::spawn(runner::run(
        pipeline,
        audio,
        command_rx,
        report_tx.clone(),
    ));

    // Create IPC server
    let server = Server::new(&config.socket_path, command_tx.clone(), report_tx.clone())?;

    // Replay recorded frames, if configured
    let replay_handle = config.replay.as_ref().map(|path| {
        let feed = ReplayFeed::new(path);
        let command_tx = command_tx.clone();
        tokio::spawn(async move {
            match feed.run(command_tx).await {
                Ok(stats) => info!(sent = stats.sent, skipped = stats.skipped, "replay complete"),
                Err(e) => error!(path = %feed.path().display(), %e, "replay failed"),
            }
        })
    });

    // Subscribe to frame reports for status tracking
    let mut status_rx = report_tx.subscribe();
    let server_for_status = &server;

    info!("daemon initialized, entering main loop");

    // Main event loop
    tokio::select! {
        // Run the IPC server (accepts client connections)
        result = server.run() => {
            if let Err(e) = result {
                error!(?e, "IPC server error");
            }
        }

        // Keep the status snapshot in step with the pipeline
        _ = async {
            loop {
                match status_rx.recv().await {
                    Ok(report) => {
                        server_for_status.record_report(&report).await;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(skipped = n, "status receiver lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        break;
                    }
                }
            }
        } => {
            info!("status tracker exited");
        }

        // Wait for shutdown signal
        result = shutdown.wait() => {
            match result {
                Ok(reason) => info!(%reason, "shutdown signal received"),
                Err(e) => error!(?e, "shutdown signal handler failed"),
            }
        }
    }

    // Cleanup
    info!("shutting down...");

    if let Some(handle) = replay_handle {
        handle.abort();
    }
    server.shutdown().await;
    drop(server);
    drop(command_tx);

    match tokio::time::timeout(Duration::from_secs(2), runner_handle).await {
        Ok(Ok(_audio)) => info!("pipeline runner stopped"),
        Ok(Err(e)) => error!(?e, "pipeline runner panicked"),
        Err(_) => warn!("pipeline runner did not stop in time"),
    }

    info!("air-guitar-daemon stopped");

    Ok(())
}
