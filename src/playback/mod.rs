//! Playback module: the audio boundary and edge-triggered note playback

mod audio;
mod trigger;

pub use audio::{AudioError, AudioSink, SampleLibrary};
pub use trigger::{PlaybackCommand, PlaybackTrigger};

#[cfg(test)]
pub mod testing;
