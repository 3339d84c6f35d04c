//! Pipeline runner task
//!
//! A single task owns the pipeline and the audio sink. Frames arrive as
//! commands and are processed strictly one at a time; each report is
//! broadcast to whoever is listening.

use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::hand::FrameInput;
use crate::playback::AudioSink;

use super::{FrameReport, Pipeline, SessionSnapshot};

/// Requests handled by the runner
#[derive(Debug)]
pub enum PipelineCommand {
    /// Process one frame, optionally replying with its report
    Process {
        frame: FrameInput,
        reply: Option<oneshot::Sender<FrameReport>>,
    },
    /// Start a new session and silence the audio, replying with the fresh state
    Reset {
        reply: Option<oneshot::Sender<SessionSnapshot>>,
    },
}

/// Drive the pipeline until every command sender is gone
///
/// Returns the audio sink so callers can inspect or reuse it.
pub async fn run<A: AudioSink>(
    mut pipeline: Pipeline,
    mut audio: A,
    mut command_rx: mpsc::Receiver<PipelineCommand>,
    report_tx: broadcast::Sender<FrameReport>,
) -> A {
    if let Err(e) = audio.set_volume(pipeline.volume()) {
        warn!(error = %e, "failed to set initial volume");
    }
    info!(volume = audio.volume(), "pipeline runner started");

    while let Some(command) = command_rx.recv().await {
        match command {
            PipelineCommand::Process { frame, reply } => {
                let report = pipeline.process_frame(&frame, &mut audio);
                for event in &report.events {
                    debug!(frame = report.frame_index, %event, "control event");
                }

                // No subscribers is fine
                let _ = report_tx.send(report.clone());

                if let Some(reply) = reply {
                    if reply.send(report).is_err() {
                        debug!("frame reply receiver dropped");
                    }
                }
            }
            PipelineCommand::Reset { reply } => {
                pipeline.reset();
                if let Err(e) = audio.stop_all() {
                    warn!(error = %e, "failed to stop audio on reset");
                }
                if let Err(e) = audio.set_volume(pipeline.volume()) {
                    warn!(error = %e, "failed to restore volume on reset");
                }
                debug!(volume = audio.volume(), "audio restored after reset");
                if let Some(reply) = reply {
                    if reply.send(pipeline.snapshot()).is_err() {
                        debug!("reset reply receiver dropped");
                    }
                }
            }
        }
    }

    info!(
        frames = pipeline.frames_processed(),
        "pipeline runner stopped"
    );
    audio
}
