//! Per-frame hand side resolution
//!
//! Normalizes upstream handedness labels and guarantees at most one Left and
//! one Right hand per frame. Duplicate sides come from tracker glitches; the
//! copy with more raw extended fingers wins, first seen on ties.

use tracing::debug;

use super::classifier::Classification;
use super::landmarks::HandObservation;
use super::side::HandSide;

/// An observation with its raw classification attached
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifiedHand {
    /// Position in the frame's observation list
    pub slot: usize,
    pub side: HandSide,
    pub observation: HandObservation,
    pub raw: Classification,
}

impl ClassifiedHand {
    pub fn new(slot: usize, observation: HandObservation, raw: Classification) -> Self {
        Self {
            slot,
            side: HandSide::from_label(&observation.label),
            observation,
            raw,
        }
    }

    fn raw_extended_count(&self) -> usize {
        self.raw.states.extended_count()
    }
}

/// Result of resolving one frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedHands {
    pub left: Option<ClassifiedHand>,
    pub right: Option<ClassifiedHand>,
    /// Hands with an unusable label; shown but never mapped
    pub unknown: Vec<ClassifiedHand>,
    /// Same-side duplicates discarded this frame
    pub dropped: usize,
}

/// Collapse a frame's hands to at most one per side
pub fn resolve_sides(hands: impl IntoIterator<Item = ClassifiedHand>) -> ResolvedHands {
    let mut resolved = ResolvedHands::default();

    for hand in hands {
        let slot = match hand.side {
            HandSide::Left => &mut resolved.left,
            HandSide::Right => &mut resolved.right,
            HandSide::Unknown => {
                debug!(label = %hand.observation.label, slot = hand.slot, "unrecognized hand label");
                resolved.unknown.push(hand);
                continue;
            }
        };

        match slot.as_ref().map(|kept| (kept.slot, kept.raw_extended_count())) {
            None => *slot = Some(hand),
            Some((kept_slot, kept_count)) if hand.raw_extended_count() > kept_count => {
                debug!(
                    side = %hand.side,
                    kept = hand.slot,
                    dropped = kept_slot,
                    "duplicate side replaced"
                );
                *slot = Some(hand);
                resolved.dropped += 1;
            }
            Some((kept_slot, _)) => {
                debug!(side = %hand.side, kept = kept_slot, dropped = hand.slot, "duplicate side ignored");
                resolved.dropped += 1;
            }
        }
    }

    resolved
}
