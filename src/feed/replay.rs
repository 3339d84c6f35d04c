//! JSON-lines replay of recorded frames
//!
//! One `FrameInput` per line. Blank lines are skipped, malformed lines are
//! logged and skipped. Frames are sent in file order and each one waits for
//! room in the runner's queue, so pacing follows the pipeline.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::hand::FrameInput;
use crate::pipeline::runner::PipelineCommand;

/// Errors raised while reading a replay file
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Counters for one replay pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub sent: u64,
    pub skipped: u64,
}

pub struct ReplayFeed {
    path: PathBuf,
}

impl ReplayFeed {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_owned(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Send every frame in the file to the runner
    ///
    /// Stops early, without error, if the runner goes away.
    pub async fn run(&self, command_tx: mpsc::Sender<PipelineCommand>) -> Result<ReplayStats, FeedError> {
        let io_error = |source| FeedError::Io {
            path: self.path.clone(),
            source,
        };

        let file = File::open(&self.path).await.map_err(io_error)?;
        let mut lines = BufReader::new(file).lines();
        let mut stats = ReplayStats::default();
        let mut line_no = 0;

        info!(path = %self.path.display(), "replay started");

        while let Some(line) = lines.next_line().await.map_err(io_error)? {
            line_no += 1;
            let frame = match parse_line(line_no, &line) {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(e) => {
                    warn!(path = %self.path.display(), error = %e, "skipping malformed frame");
                    stats.skipped += 1;
                    continue;
                }
            };

            let command = PipelineCommand::Process { frame, reply: None };
            if command_tx.send(command).await.is_err() {
                debug!("pipeline runner closed, stopping replay");
                break;
            }
            stats.sent += 1;
        }

        info!(sent = stats.sent, skipped = stats.skipped, "replay finished");
        Ok(stats)
    }
}

/// Parse one line; `None` for blank lines
pub fn parse_line(line_no: usize, line: &str) -> Result<Option<FrameInput>, FeedError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    serde_json::from_str(line)
        .map(Some)
        .map_err(|source| FeedError::Parse {
            line: line_no,
            source,
        })
}
