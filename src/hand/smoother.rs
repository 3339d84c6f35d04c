//! Sliding-window debounce of raw finger states
//!
//! Each side keeps the last few raw vectors. A finger is reported extended
//! when it was extended in strictly more than half of the buffered frames,
//! so ties resolve to flexed.

use std::collections::VecDeque;

use super::fingers::FingerStates;

/// Default number of frames in the voting window
pub const DEFAULT_WINDOW: usize = 5;

/// Default minimum extended fingers in the latest raw frame that overrides an
/// all-flexed majority
pub const DEFAULT_FALLBACK_MIN_EXTENDED: usize = 2;

/// Per-finger strict majority over a set of frames
pub fn majority_vote<'a>(frames: impl IntoIterator<Item = &'a FingerStates>) -> FingerStates {
    let frames: Vec<&FingerStates> = frames.into_iter().collect();
    FingerStates::from_fn(|finger| {
        let votes = frames.iter().filter(|frame| frame.get(finger)).count();
        votes * 2 > frames.len()
    })
}

/// Debounces one side's raw classifications
#[derive(Debug, Clone)]
pub struct TemporalSmoother {
    window: VecDeque<FingerStates>,
    capacity: usize,
    fallback_min_extended: usize,
}

impl Default for TemporalSmoother {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW, DEFAULT_FALLBACK_MIN_EXTENDED)
    }
}

impl TemporalSmoother {
    pub fn new(capacity: usize, fallback_min_extended: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            window: VecDeque::with_capacity(capacity),
            capacity,
            fallback_min_extended,
        }
    }

    /// Push a raw vector and return the debounced state
    ///
    /// When the vote comes out all-flexed but the newest raw frame shows at
    /// least `fallback_min_extended` fingers, the newest frame wins. This keeps
    /// a hand that opens after a run of flexed frames from being erased.
    pub fn push(&mut self, raw: FingerStates) -> FingerStates {
        if self.window.len() == self.capacity {
            self.window.pop_front();
        }
        self.window.push_back(raw);

        let voted = majority_vote(&self.window);
        if voted.is_fist() && raw.extended_count() >= self.fallback_min_extended.max(1) {
            return raw;
        }
        voted
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
impl TemporalSmoother {
    /// Current vote without pushing
    fn current(&self) -> FingerStates {
        majority_vote(&self.window)
    }

    fn len(&self) -> usize {
        self.window.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hand::fingers::Finger;

    fn only(fingers: &[Finger]) -> FingerStates {
        FingerStates::with_extended(fingers)
    }

    #[test]
    fn test_single_glitch_is_suppressed() {
        let mut smoother = TemporalSmoother::default();
        for _ in 0..4 {
            smoother.push(only(&[Finger::Index]));
        }
        // One frame drops the index and raises the pinky
        let smoothed = smoother.push(only(&[Finger::Pinky]));
        assert_eq!(smoothed, only(&[Finger::Index]));
    }

    #[test]
    fn test_ties_resolve_to_flexed() {
        let mut smoother = TemporalSmoother::new(4, DEFAULT_FALLBACK_MIN_EXTENDED);
        smoother.push(only(&[Finger::Middle]));
        smoother.push(only(&[Finger::Middle]));
        smoother.push(FingerStates::FIST);
        let smoothed = smoother.push(FingerStates::FIST);
        assert!(!smoothed.middle);
    }

    #[test]
    fn test_window_evicts_oldest() {
        let mut smoother = TemporalSmoother::default();
        for _ in 0..5 {
            smoother.push(FingerStates::OPEN);
        }
        for _ in 0..5 {
            smoother.push(FingerStates::FIST);
        }
        assert_eq!(smoother.len(), DEFAULT_WINDOW);
        assert_eq!(smoother.current(), FingerStates::FIST);
    }

    #[test]
    fn test_fallback_prefers_strong_recent_frame() {
        let mut smoother = TemporalSmoother::default();
        for _ in 0..4 {
            smoother.push(FingerStates::FIST);
        }
        let recent = only(&[Finger::Index, Finger::Middle, Finger::Ring]);
        assert_eq!(smoother.push(recent), recent);
    }

    #[test]
    fn test_fallback_ignores_weak_recent_frame() {
        let mut smoother = TemporalSmoother::default();
        for _ in 0..4 {
            smoother.push(FingerStates::FIST);
        }
        assert_eq!(smoother.push(only(&[Finger::Index])), FingerStates::FIST);
    }

    #[test]
    fn test_vote_is_order_independent() {
        let frames = [
            only(&[Finger::Thumb, Finger::Index]),
            only(&[Finger::Index]),
            FingerStates::OPEN,
            only(&[Finger::Pinky]),
            FingerStates::FIST,
        ];
        let expected = majority_vote(&frames);
        let orders: [[usize; 5]; 4] = [
            [4, 3, 2, 1, 0],
            [2, 0, 4, 1, 3],
            [1, 2, 3, 4, 0],
            [3, 4, 0, 2, 1],
        ];
        for order in orders {
            let permuted: Vec<_> = order.iter().map(|i| frames[*i]).collect();
            assert_eq!(majority_vote(&permuted), expected);
        }
        assert_eq!(expected, only(&[Finger::Index]));
    }

    #[test]
    fn test_clear_empties_window() {
        let mut smoother = TemporalSmoother::default();
        smoother.push(FingerStates::OPEN);
        smoother.clear();
        assert_eq!(smoother.len(), 0);
        assert_eq!(smoother.current(), FingerStates::FIST);
    }
}
