//! Frame sources
//!
//! The capture provider lives outside this daemon. Frames reach the pipeline
//! either over IPC (`submit_frame`) or from a recorded JSON-lines file.

mod replay;

pub use replay::ReplayFeed;
