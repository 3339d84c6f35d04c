//! Hand module: landmark geometry, finger classification, smoothing and
//! side resolution
//!
//! Everything here works on a single frame or a single side's history;
//! cross-hand decisions live in `mapping` and `state`.

mod classifier;
mod fingers;
mod landmarks;
mod resolver;
mod side;
mod smoother;

#[cfg(test)]
pub mod fixtures;

pub use classifier::{ClassifierParams, ClassifierStrategy, Confidence, FingerStateClassifier};
pub use fingers::{Finger, FingerStates};
pub use landmarks::{BoundingBox, FrameInput};
pub use resolver::{resolve_sides, ClassifiedHand};
pub use side::{HandSide, SidePair};
pub use smoother::TemporalSmoother;

#[cfg(test)]
pub use landmarks::HandObservation;
