//! Unix domain socket server for IPC
//!
//! Provides request-response communication and push notifications of frame
//! reports to subscribed clients. Frames submitted here go through the same
//! runner queue as every other source.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::pipeline::runner::PipelineCommand;
use crate::pipeline::FrameReport;

use super::protocol::{encode, DaemonStatus, Notification, Request, Response, MAX_MESSAGE_LEN};

/// IPC Server handling client connections
pub struct Server {
    socket_path: PathBuf,
    listener: Option<UnixListener>,
    context: ClientContext,
    shutdown_tx: broadcast::Sender<()>,
}

/// Shared server state
struct ServerState {
    status: DaemonStatus,
    start_time: std::time::Instant,
}

/// Everything a client handler needs
#[derive(Clone)]
struct ClientContext {
    state: Arc<RwLock<ServerState>>,
    command_tx: mpsc::Sender<PipelineCommand>,
    report_tx: broadcast::Sender<FrameReport>,
}

impl Server {
    /// Create a new IPC server
    pub fn new(
        socket_path: &Path,
        command_tx: mpsc::Sender<PipelineCommand>,
        report_tx: broadcast::Sender<FrameReport>,
    ) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = socket_path.parent() {
            std::fs::create_dir_all(parent).context("failed to create socket directory")?;
        }

        // Remove stale socket if it exists
        if socket_path.exists() {
            std::fs::remove_file(socket_path).context("failed to remove stale socket")?;
        }

        let listener = UnixListener::bind(socket_path).context("failed to bind Unix socket")?;

        // Set socket permissions to owner-only (0600)
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
        }

        let (shutdown_tx, _) = broadcast::channel(1);

        info!(?socket_path, "IPC server listening");

        Ok(Self {
            socket_path: socket_path.to_owned(),
            listener: Some(listener),
            context: ClientContext::new(command_tx, report_tx),
            shutdown_tx,
        })
    }

    /// Fold a processed frame into the status snapshot
    pub async fn record_report(&self, report: &FrameReport) {
        let mut state = self.context.state.write().await;
        let old_mode = state.status.mode;
        state.status.apply(report);

        if old_mode != report.mode {
            info!(
                from = %old_mode,
                to = %report.mode,
                "IPC server: mode updated"
            );
        }
    }

    /// Run the server, accepting connections
    pub async fn run(&self) -> Result<()> {
        let listener = self.listener.as_ref().context("server not initialized")?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    debug!("client connected");
                    let context = self.context.clone();
                    let mut shutdown_rx = self.shutdown_tx.subscribe();

                    tokio::spawn(async move {
                        tokio::select! {
                            result = handle_client(stream, context) => {
                                if let Err(e) = result {
                                    warn!(?e, "client handler error");
                                }
                            }
                            _ = shutdown_rx.recv() => {
                                debug!("client handler shutting down");
                            }
                        }
                    });
                }
                Err(e) => {
                    error!(?e, "accept error");
                }
            }
        }
    }

    /// Gracefully shutdown the server
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());

        // Remove socket file
        if self.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.socket_path) {
                warn!(?e, "failed to remove socket file");
            }
        }

        info!("IPC server shutdown complete");
    }
}

impl ClientContext {
    fn new(
        command_tx: mpsc::Sender<PipelineCommand>,
        report_tx: broadcast::Sender<FrameReport>,
    ) -> Self {
        Self {
            state: Arc::new(RwLock::new(ServerState {
                status: DaemonStatus::default(),
                start_time: std::time::Instant::now(),
            })),
            command_tx,
            report_tx,
        }
    }
}

/// Handle a single client connection
///
/// Replies and notifications share one writer task so their frames never
/// interleave.
async fn handle_client(stream: UnixStream, context: ClientContext) -> Result<()> {
    let (mut reader, mut writer) = stream.into_split();
    let (out_tx, mut out_rx) = mpsc::channel::<Vec<u8>>(64);

    let writer_task = tokio::spawn(async move {
        while let Some(bytes) = out_rx.recv().await {
            if let Err(e) = writer.write_all(&bytes).await {
                debug!(?e, "client write failed");
                break;
            }
        }
    });

    let mut forwarder: Option<JoinHandle<()>> = None;
    let result = serve_requests(&mut reader, &context, &out_tx, &mut forwarder).await;

    if let Some(forwarder) = forwarder {
        forwarder.abort();
    }
    drop(out_tx);
    let _ = writer_task.await;

    result
}

async fn serve_requests<R: AsyncRead + Unpin>(
    reader: &mut R,
    context: &ClientContext,
    out_tx: &mpsc::Sender<Vec<u8>>,
    forwarder: &mut Option<JoinHandle<()>>,
) -> Result<()> {
    while let Some(body) = read_message(reader).await? {
        let response = match serde_json::from_slice::<Request>(&body) {
            Ok(request) => {
                debug!(?request, "received request");
                if matches!(request, Request::Subscribe) && forwarder.is_none() {
                    *forwarder = Some(spawn_forwarder(
                        context.report_tx.subscribe(),
                        out_tx.clone(),
                    ));
                    debug!("client subscribed to notifications");
                }
                process_request(request, context).await
            }
            Err(e) => {
                warn!(?e, "failed to parse request");
                Response::error("invalid_request", e.to_string())
            }
        };

        let bytes = encode(&response).context("failed to encode response")?;
        if out_tx.send(bytes).await.is_err() {
            debug!("client writer closed");
            break;
        }
    }

    debug!("client disconnected");
    Ok(())
}

/// Read one length-prefixed message; `None` on clean disconnect
async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    // Read message length (4-byte little-endian)
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(_) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(None),
        Err(e) => return Err(e.into()),
    }

    let len = u32::from_le_bytes(len_buf) as usize;
    if len > MAX_MESSAGE_LEN {
        warn!(len, "message too large, disconnecting");
        return Ok(None);
    }

    // Read message body
    let mut msg_buf = vec![0u8; len];
    reader.read_exact(&mut msg_buf).await?;
    Ok(Some(msg_buf))
}

/// Push every frame report to one subscribed client
fn spawn_forwarder(
    mut report_rx: broadcast::Receiver<FrameReport>,
    out_tx: mpsc::Sender<Vec<u8>>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match report_rx.recv().await {
                Ok(report) => {
                    let bytes = match encode(&Notification::Frame(report)) {
                        Ok(bytes) => bytes,
                        Err(e) => {
                            warn!(?e, "failed to encode notification");
                            continue;
                        }
                    };
                    if out_tx.send(bytes).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "subscriber lagged, frames dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    })
}

/// Process a request and return a response
async fn process_request(request: Request, context: &ClientContext) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::GetStatus => {
            let mut state = context.state.write().await;
            state.status.uptime_secs = state.start_time.elapsed().as_secs();
            Response::Status(state.status.clone())
        }

        Request::SubmitFrame { frame } => {
            let (reply_tx, reply_rx) = oneshot::channel();
            let command = PipelineCommand::Process {
                frame,
                reply: Some(reply_tx),
            };
            if context.command_tx.send(command).await.is_err() {
                return Response::error("pipeline_unavailable", "pipeline runner has stopped");
            }
            match reply_rx.await {
                Ok(report) => Response::FrameProcessed(report),
                Err(_) => Response::error("pipeline_unavailable", "frame was not processed"),
            }
        }

        Request::Subscribe => Response::Subscribed,

        Request::ResetSession => {
            let (reply_tx, reply_rx) = oneshot::channel();
            let command = PipelineCommand::Reset {
                reply: Some(reply_tx),
            };
            if context.command_tx.send(command).await.is_err() {
                return Response::error("pipeline_unavailable", "pipeline runner has stopped");
            }
            let Ok(snapshot) = reply_rx.await else {
                return Response::error("pipeline_unavailable", "session was not reset");
            };
            context.state.write().await.status.restore(&snapshot);
            info!("session reset via IPC");
            Response::SessionReset
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::hand::fixtures::observation;
    use crate::hand::{Finger, FrameInput};
    use crate::pipeline::{runner, Pipeline};
    use crate::playback::testing::RecordingSink;
    use crate::state::ControlMode;

    /// Client end of a connected socket pair, served by a live pipeline
    fn connect() -> UnixStream {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (report_tx, _) = broadcast::channel(16);
        let pipeline = Pipeline::new(&PipelineConfig::default());
        tokio::spawn(runner::run(
            pipeline,
            RecordingSink::new(),
            command_rx,
            report_tx.clone(),
        ));

        let (client, server) = UnixStream::pair().unwrap();
        let context = ClientContext::new(command_tx, report_tx);
        tokio::spawn(handle_client(server, context));
        client
    }

    async fn send(stream: &mut UnixStream, request: &Request) {
        stream.write_all(&encode(request).unwrap()).await.unwrap();
    }

    async fn recv(stream: &mut UnixStream) -> serde_json::Value {
        let body = read_message(stream).await.unwrap().unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn frame(index: u64) -> FrameInput {
        FrameInput {
            frame_index: index,
            hands: vec![
                observation("Left", 0.3, 0.9, &[Finger::Middle]),
                observation("Right", 0.7, 0.9, &[Finger::Index, Finger::Middle]),
            ],
        }
    }

    #[tokio::test]
    async fn test_ping_pong() {
        let mut client = connect();
        send(&mut client, &Request::Ping).await;
        assert_eq!(recv(&mut client).await["type"], "pong");
    }

    #[tokio::test]
    async fn test_submit_frame() {
        let mut client = connect();
        send(&mut client, &Request::SubmitFrame { frame: frame(5) }).await;

        let response = recv(&mut client).await;
        assert_eq!(response["type"], "frame_processed");
        assert_eq!(response["frame_index"], 5);
        assert_eq!(response["current_string"], 3);
        assert_eq!(response["current_fret"], 2);
        assert_eq!(response["playback"]["forced"], false);
    }

    #[tokio::test]
    async fn test_subscriber_receives_notifications() {
        let mut client = connect();
        send(&mut client, &Request::Subscribe).await;
        assert_eq!(recv(&mut client).await["type"], "subscribed");

        send(&mut client, &Request::SubmitFrame { frame: frame(9) }).await;

        // Reply and notification may arrive in either order
        let first = recv(&mut client).await;
        let second = recv(&mut client).await;
        let mut types = vec![
            first["type"].as_str().unwrap().to_string(),
            second["type"].as_str().unwrap().to_string(),
        ];
        types.sort();
        assert_eq!(types, vec!["frame", "frame_processed"]);
        assert_eq!(first["frame_index"], 9);
        assert_eq!(second["frame_index"], 9);
    }

    #[tokio::test]
    async fn test_invalid_request_keeps_connection() {
        let mut client = connect();
        let garbage = b"{\"type\":\"strum_harder\"}";
        client
            .write_all(&(garbage.len() as u32).to_le_bytes())
            .await
            .unwrap();
        client.write_all(garbage).await.unwrap();

        let response = recv(&mut client).await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["code"], "invalid_request");

        send(&mut client, &Request::Ping).await;
        assert_eq!(recv(&mut client).await["type"], "pong");
    }

    #[tokio::test]
    async fn test_reset_session() {
        let mut client = connect();
        send(&mut client, &Request::ResetSession).await;
        assert_eq!(recv(&mut client).await["type"], "session_reset");
    }

    #[tokio::test]
    async fn test_status_after_reset_is_idle() {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (report_tx, _) = broadcast::channel(16);
        let pipeline = Pipeline::new(&PipelineConfig::default());
        tokio::spawn(runner::run(
            pipeline,
            RecordingSink::new(),
            command_rx,
            report_tx.clone(),
        ));
        let context = ClientContext::new(command_tx, report_tx);

        // Right fist starts recording with string 2 and fret 0 held
        let fist = FrameInput {
            frame_index: 1,
            hands: vec![
                observation("Left", 0.3, 0.9, &[Finger::Index]),
                observation("Right", 0.7, 0.9, &[]),
            ],
        };
        match process_request(Request::SubmitFrame { frame: fist }, &context).await {
            Response::FrameProcessed(report) => context.state.write().await.status.apply(&report),
            other => panic!("unexpected response: {:?}", other),
        }

        assert!(matches!(
            process_request(Request::ResetSession, &context).await,
            Response::SessionReset
        ));

        match process_request(Request::GetStatus, &context).await {
            Response::Status(status) => {
                assert_eq!(status.mode, ControlMode::Idle);
                assert_eq!(status.current_string, None);
                assert_eq!(status.current_fret, None);
                assert!((status.volume - 0.7).abs() < 1e-6);
                assert_eq!(status.frames_processed, 1);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stale_report_does_not_undo_reset() {
        let (command_tx, _command_rx) = mpsc::channel(1);
        let (report_tx, _) = broadcast::channel(1);
        let context = ClientContext::new(command_tx, report_tx);

        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        let report = pipeline.process_frame(
            &FrameInput {
                frame_index: 1,
                hands: vec![observation("Right", 0.7, 0.9, &[])],
            },
            &mut RecordingSink::new(),
        );
        pipeline.reset();

        let mut state = context.state.write().await;
        state.status.restore(&pipeline.snapshot());
        // The tracker delivers the pre-reset report late
        state.status.apply(&report);
        assert_eq!(state.status.mode, ControlMode::Idle);
        assert_eq!(state.status.current_fret, None);
    }

    #[tokio::test]
    async fn test_status_reflects_reports() {
        let (command_tx, _command_rx) = mpsc::channel(1);
        let (report_tx, _) = broadcast::channel(1);
        let context = ClientContext::new(command_tx, report_tx);

        let right_fist = |index| FrameInput {
            frame_index: index,
            hands: vec![observation("Right", 0.7, 0.9, &[])],
        };
        let mut pipeline = Pipeline::new(&PipelineConfig::default());
        let report = pipeline.process_frame(&right_fist(1), &mut RecordingSink::new());
        context.state.write().await.status.apply(&report);

        // Frames the tracker never saw still count
        pipeline.process_frame(&right_fist(2), &mut RecordingSink::new());
        let report = pipeline.process_frame(&right_fist(3), &mut RecordingSink::new());
        context.state.write().await.status.apply(&report);

        match process_request(Request::GetStatus, &context).await {
            Response::Status(status) => {
                assert_eq!(status.mode, ControlMode::Recording);
                assert_eq!(status.frames_processed, 3);
                assert_eq!(status.current_fret, Some(0));
                assert_eq!(status.current_string, None);
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
