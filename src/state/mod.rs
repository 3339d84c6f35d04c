//! State machine module for control gestures
//!
//! Provides an explicit state machine with two modes:
//! - Idle: Default mode, waiting for a right fist
//! - Recording: Entered on a right fist with the left hand open or absent,
//!   left when both hands form fists
//!
//! The same detector steps the volume from the right wrist's vertical trend.

mod machine;

pub use machine::{ControlGestureDetector, ControlMode, ControlParams, FistRule, HandControlInput};
