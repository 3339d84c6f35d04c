//! IPC message protocol definitions
//!
//! All messages are JSON-encoded, prefixed with a 4-byte little-endian length.

use serde::{Deserialize, Serialize};

use crate::hand::FrameInput;
use crate::pipeline::{FrameReport, SessionSnapshot};
use crate::state::ControlMode;

/// Largest accepted message body
pub const MAX_MESSAGE_LEN: usize = 1024 * 1024;

/// Requests from client to daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Request current daemon status
    GetStatus,

    /// Run one frame through the pipeline and return its report
    SubmitFrame { frame: FrameInput },

    /// Ping to check connectivity
    Ping,

    /// Subscribe to per-frame notifications
    Subscribe,

    /// Start a new session: Idle, initial volume, audio stopped
    ResetSession,
}

/// Responses from daemon to client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Current daemon status
    Status(DaemonStatus),

    /// Report for a submitted frame
    FrameProcessed(FrameReport),

    /// Pong response to ping
    Pong,

    /// Subscription confirmed
    Subscribed,

    SessionReset,

    /// Error response
    Error { code: String, message: String },
}

impl Response {
    pub fn error(code: &str, message: impl Into<String>) -> Self {
        Response::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

/// Push notification from daemon to client (for subscribed clients)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A frame was processed, from any source
    Frame(FrameReport),
}

/// Full daemon status snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonStatus {
    /// Daemon version
    pub version: String,

    /// Current control mode
    pub mode: ControlMode,

    pub volume: f32,

    pub current_string: Option<u8>,

    pub current_fret: Option<u8>,

    /// Frames seen since startup
    pub frames_processed: u64,

    /// Uptime in seconds
    pub uptime_secs: u64,
}

impl Default for DaemonStatus {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            mode: ControlMode::default(),
            volume: 0.7,
            current_string: None,
            current_fret: None,
            frames_processed: 0,
            uptime_secs: 0,
        }
    }
}

impl DaemonStatus {
    /// Fold a frame report into the snapshot
    ///
    /// Reports no newer than what is already folded in are ignored, so a
    /// lagging tracker cannot undo a reset.
    pub fn apply(&mut self, report: &FrameReport) {
        if report.frames_processed <= self.frames_processed {
            return;
        }
        self.mode = report.mode;
        self.volume = report.volume;
        self.current_string = report.current_string;
        self.current_fret = report.current_fret;
        self.frames_processed = report.frames_processed;
    }

    /// Overwrite control and mapping state after a session reset
    pub fn restore(&mut self, snapshot: &SessionSnapshot) {
        self.mode = snapshot.mode;
        self.volume = snapshot.volume;
        self.current_string = snapshot.mapping.current_string;
        self.current_fret = snapshot.mapping.current_fret;
        self.frames_processed = snapshot.frames_processed;
    }
}

/// Length-prefix a serialized message
pub fn encode<T: Serialize>(msg: &T) -> serde_json::Result<Vec<u8>> {
    let body = serde_json::to_vec(msg)?;
    let mut bytes = Vec::with_capacity(4 + body.len());
    bytes.extend_from_slice(&(body.len() as u32).to_le_bytes());
    bytes.extend_from_slice(&body);
    Ok(bytes)
}
