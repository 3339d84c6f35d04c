//! Control gesture state machine
//!
//! Handles transitions between Idle and Recording from fist gestures, and
//! steps the volume from the right wrist's vertical trend.

use std::collections::VecDeque;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::ConfigError;
use crate::events::ControlEvent;
use crate::hand::FingerStates;

/// The two control modes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    /// Waiting for a right fist
    #[default]
    Idle,
    /// Started by a right fist, ended by two fists
    Recording,
}

impl std::fmt::Display for ControlMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControlMode::Idle => write!(f, "Idle"),
            ControlMode::Recording => write!(f, "Recording"),
        }
    }
}

/// Which fingers must be flexed for a hand to count as a fist
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FistRule {
    /// All five fingers flexed
    #[default]
    AllFingers,
    /// Thumb, index and middle flexed
    LeadingThree,
}

impl FistRule {
    pub fn is_fist(&self, states: &FingerStates) -> bool {
        match self {
            FistRule::AllFingers => states.is_fist(),
            FistRule::LeadingThree => states.is_leading_three_flexed(),
        }
    }
}

impl FromStr for FistRule {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all_fingers" | "all" => Ok(Self::AllFingers),
            "leading_three" | "three" => Ok(Self::LeadingThree),
            other => Err(ConfigError::UnknownOption {
                kind: "fist rule",
                value: other.to_string(),
            }),
        }
    }
}

/// Tunables for the control detector
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlParams {
    pub fist_rule: FistRule,
    pub initial_volume: f32,
    pub volume_step: f32,
    /// Right wrist samples kept
    pub wrist_history: usize,
    /// Samples spanned by the trend comparison
    pub trend_window: usize,
    /// Minimum wrist movement over the trend window, normalized units
    pub trend_threshold: f32,
}

impl Default for ControlParams {
    fn default() -> Self {
        Self {
            fist_rule: FistRule::AllFingers,
            initial_volume: 0.7,
            volume_step: 0.05,
            wrist_history: 10,
            trend_window: 5,
            trend_threshold: 20.0 / 480.0,
        }
    }
}

/// What the control detector needs from one resolved hand
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandControlInput {
    pub states: FingerStates,
    pub wrist_y: Option<f32>,
}

/// Outcome of one control update
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlUpdate {
    pub transition: Option<(ControlMode, ControlMode)>,
    pub volume: Option<f32>,
    pub events: Vec<ControlEvent>,
}

impl ControlUpdate {
    /// Idle → Recording happened this frame
    pub fn started_recording(&self) -> bool {
        matches!(self.transition, Some((_, ControlMode::Recording)))
    }

    /// Recording → Idle happened this frame
    pub fn stopped_recording(&self) -> bool {
        matches!(self.transition, Some((_, ControlMode::Idle)))
    }
}

/// Fist-driven mode machine plus wrist-trend volume control
#[derive(Debug, Clone)]
pub struct ControlGestureDetector {
    mode: ControlMode,
    volume: f32,
    /// Frames spent in the current mode
    frames_in_mode: u64,
    /// Right wrist heights, oldest first
    wrist_history: VecDeque<f32>,
    params: ControlParams,
}

impl Default for ControlGestureDetector {
    fn default() -> Self {
        Self::new(ControlParams::default())
    }
}

impl ControlGestureDetector {
    pub fn new(params: ControlParams) -> Self {
        Self {
            mode: ControlMode::Idle,
            volume: params.initial_volume.clamp(0.0, 1.0),
            frames_in_mode: 0,
            wrist_history: VecDeque::new(),
            params,
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn is_recording(&self) -> bool {
        self.mode == ControlMode::Recording
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Process one frame's resolved hands
    pub fn update(
        &mut self,
        left: Option<&HandControlInput>,
        right: Option<&HandControlInput>,
    ) -> ControlUpdate {
        let mut update = ControlUpdate::default();
        self.frames_in_mode += 1;

        let left_fist = left.is_some_and(|hand| self.params.fist_rule.is_fist(&hand.states));
        let right_fist = right.is_some_and(|hand| self.params.fist_rule.is_fist(&hand.states));

        let old_mode = self.mode;
        let new_mode = self.compute_next_mode(left_fist, right_fist);
        if new_mode != old_mode {
            update.events.push(self.transition_to(new_mode));
            update.transition = Some((old_mode, new_mode));
        }

        self.record_wrist(right.and_then(|hand| hand.wrist_y));

        // A start or end gesture takes the frame; no volume step alongside it
        if right_fist {
            return update;
        }
        if let Some(volume) = self.apply_volume_trend() {
            update.volume = Some(volume);
            update.events.push(ControlEvent::VolumeChanged { volume });
        }

        update
    }

    /// Return to Idle at the initial volume with no wrist history
    pub fn reset(&mut self) {
        *self = Self::new(self.params);
    }

    fn compute_next_mode(&self, left_fist: bool, right_fist: bool) -> ControlMode {
        match self.mode {
            ControlMode::Idle => self.compute_from_idle(left_fist, right_fist),
            ControlMode::Recording => self.compute_from_recording(left_fist, right_fist),
        }
    }

    fn compute_from_idle(&self, left_fist: bool, right_fist: bool) -> ControlMode {
        if right_fist && !left_fist {
            ControlMode::Recording
        } else {
            ControlMode::Idle
        }
    }

    fn compute_from_recording(&self, left_fist: bool, right_fist: bool) -> ControlMode {
        if right_fist && left_fist {
            ControlMode::Idle
        } else {
            ControlMode::Recording
        }
    }

    fn transition_to(&mut self, new_mode: ControlMode) -> ControlEvent {
        let old_mode = self.mode;
        let frames = self.frames_in_mode;

        info!(from = %old_mode, to = %new_mode, frames, "control mode transition");

        self.mode = new_mode;
        self.frames_in_mode = 0;

        match new_mode {
            ControlMode::Recording => ControlEvent::RecordingStarted,
            ControlMode::Idle => ControlEvent::RecordingStopped { frames },
        }
    }

    /// Push a right wrist sample; an unobserved hand loses its history
    fn record_wrist(&mut self, wrist_y: Option<f32>) {
        let capacity = self.params.wrist_history.max(1);
        let history = &mut self.wrist_history;
        match wrist_y {
            Some(y) => {
                if history.len() == capacity {
                    history.pop_front();
                }
                history.push_back(y);
            }
            None => history.clear(),
        }
    }

    /// Wrist movement across the trend window (negative = rising)
    fn wrist_trend(&self) -> Option<f32> {
        let history = &self.wrist_history;
        let window = self.params.trend_window.max(2);
        if history.len() < window {
            return None;
        }
        let last = *history.back()?;
        let first = *history.get(history.len() - window)?;
        Some(last - first)
    }

    fn apply_volume_trend(&mut self) -> Option<f32> {
        let delta = self.wrist_trend()?;
        let step = if delta < -self.params.trend_threshold {
            self.params.volume_step
        } else if delta > self.params.trend_threshold {
            -self.params.volume_step
        } else {
            return None;
        };

        let volume = (self.volume + step).clamp(0.0, 1.0);
        if volume == self.volume {
            debug!(volume, "volume already at limit");
            return None;
        }

        info!(from = self.volume, to = volume, delta, "volume adjusted");
        self.volume = volume;
        Some(volume)
    }
}
