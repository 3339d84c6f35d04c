//! Per-frame orchestration
//!
//! `Pipeline` owns every piece of cross-frame state (smoothing windows,
//! control state, strum reference, mapping, last played note) and runs one
//! frame to completion per call:
//!
//! classify → resolve sides → smooth → map → control → strum → trigger
//!
//! Nothing in here fails. Audio errors are logged and reported as
//! `PlaybackFailed` events.

mod report;
pub mod runner;

use tracing::{debug, info, warn};

use crate::config::PipelineConfig;
use crate::events::ControlEvent;
use crate::hand::{
    resolve_sides, ClassifiedHand, FingerStateClassifier, FingerStates, FrameInput, HandSide,
    SidePair, TemporalSmoother,
};
use crate::mapping::{FretZone, FretboardMapper, MappingState, StrumDetector};
use crate::playback::{AudioError, AudioSink, PlaybackTrigger};
use crate::state::{ControlGestureDetector, ControlMode, HandControlInput};

pub use report::{FrameReport, HandReport, SessionSnapshot};

/// A resolved left/right hand after smoothing
struct SmoothedHand {
    hand: ClassifiedHand,
    states: FingerStates,
}

pub struct Pipeline {
    config: PipelineConfig,
    classifier: FingerStateClassifier,
    smoothers: SidePair<TemporalSmoother>,
    mapper: FretboardMapper,
    control: ControlGestureDetector,
    strum: StrumDetector,
    trigger: PlaybackTrigger,
    mapping: MappingState,
    frames_processed: u64,
}

impl Pipeline {
    pub fn new(config: &PipelineConfig) -> Self {
        let smoother = TemporalSmoother::new(config.smoothing_window, config.fallback_min_extended);
        Self {
            classifier: FingerStateClassifier::new(config.classifier_strategy, config.classifier),
            smoothers: SidePair {
                left: smoother.clone(),
                right: smoother,
            },
            mapper: FretboardMapper::new(config.fret_scheme, config.zone_split),
            control: ControlGestureDetector::new(config.control),
            strum: StrumDetector::new(config.strum_threshold),
            trigger: PlaybackTrigger::new(),
            mapping: MappingState::default(),
            frames_processed: 0,
            config: config.clone(),
        }
    }

    pub fn mode(&self) -> ControlMode {
        self.control.mode()
    }

    pub fn volume(&self) -> f32 {
        self.control.volume()
    }

    pub fn mapping(&self) -> MappingState {
        self.mapping
    }

    /// Frames processed since startup, across resets
    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Mode, volume and mapping as they stand between frames
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            mode: self.mode(),
            volume: self.volume(),
            mapping: self.mapping(),
            frames_processed: self.frames_processed,
        }
    }

    /// Start a new session: empty windows, Idle, initial volume, no mapping
    pub fn reset(&mut self) {
        self.smoothers.left.clear();
        self.smoothers.right.clear();
        self.control.reset();
        self.strum.reset();
        self.trigger.reset();
        self.mapping = MappingState::default();
        info!("pipeline session reset");
    }

    /// Run one frame through every stage
    pub fn process_frame(&mut self, frame: &FrameInput, audio: &mut dyn AudioSink) -> FrameReport {
        self.frames_processed += 1;
        let mut events = Vec::new();

        // Classify and resolve
        let classified = frame.hands.iter().enumerate().map(|(slot, observation)| {
            let raw = self.classifier.classify(&observation.landmarks);
            ClassifiedHand::new(slot, observation.clone(), raw)
        });
        let resolved = resolve_sides(classified.collect::<Vec<_>>());
        if resolved.dropped > 0 {
            debug!(frame = frame.frame_index, dropped = resolved.dropped, "duplicate hands dropped");
        }

        // Smooth per side
        let left = resolved.left.map(|hand| self.smooth(HandSide::Left, hand));
        let right = resolved.right.map(|hand| self.smooth(HandSide::Right, hand));

        // Map
        let right_zone = right
            .as_ref()
            .map(|right| self.mapper.zone_for(right.hand.observation.mean_y()));
        self.mapping = MappingState {
            current_string: left.as_ref().map(|left| self.mapper.string_for(&left.states)),
            current_fret: right
                .as_ref()
                .zip(right_zone)
                .map(|(right, zone)| self.mapper.fret_for(&right.states, zone)),
        };

        // Control
        let left_input = left.as_ref().map(control_input);
        let right_input = right.as_ref().map(control_input);
        let control = self.control.update(left_input.as_ref(), right_input.as_ref());
        events.extend(control.events.iter().cloned());
        if let Some(volume) = control.volume {
            record_failure(&mut events, "set_volume", audio.set_volume(volume));
        }
        if control.stopped_recording() {
            record_failure(&mut events, "stop_all", audio.stop_all());
        }

        // Strum
        let strum = self.strum.update(
            left.as_ref().and_then(|left| left.hand.observation.bounding_box()).map(|b| b.y_min),
            right.as_ref().and_then(|right| right.hand.observation.bounding_box()).map(|b| b.y_min),
        );
        if strum.is_strum() {
            info!(frame = frame.frame_index, direction = %strum, "strum detected");
            events.push(ControlEvent::Strum { direction: strum });
            record_failure(
                &mut events,
                "play_effect",
                audio.play_effect(&self.config.strum_effect, self.config.strum_effect_volume),
            );
        }

        // Trigger
        let force = strum.is_strum() || control.started_recording();
        let playback = self.trigger.evaluate(&self.mapping, self.control.volume(), force);
        if let Some(command) = playback {
            info!(
                string = command.string,
                fret = command.fret,
                volume = command.volume,
                forced = command.forced,
                "playing note"
            );
            let result = audio.play_string_fret(command.string, command.fret, command.volume);
            if record_failure(&mut events, "play_string_fret", result) {
                events.push(ControlEvent::NotePlayed {
                    string: command.string,
                    fret: command.fret,
                    volume: command.volume,
                    forced: command.forced,
                });
            }
        }

        // Report, in the provider's hand order
        let mut hands: Vec<(usize, HandReport)> = Vec::new();
        if let Some(left) = &left {
            hands.push((left.hand.slot, self.hand_report(left, None)));
        }
        if let Some(right) = &right {
            hands.push((right.hand.slot, self.hand_report(right, right_zone)));
        }
        for unknown in resolved.unknown {
            let smoothed = SmoothedHand {
                states: unknown.raw.states,
                hand: unknown,
            };
            hands.push((smoothed.hand.slot, self.hand_report(&smoothed, None)));
        }
        hands.sort_by_key(|(slot, _)| *slot);

        FrameReport {
            frame_index: frame.frame_index,
            frames_processed: self.frames_processed,
            hands: hands.into_iter().map(|(_, report)| report).collect(),
            mode: self.control.mode(),
            recording: self.control.is_recording(),
            volume: self.control.volume(),
            current_string: self.mapping.current_string,
            current_fret: self.mapping.current_fret,
            strum,
            playback,
            events,
        }
    }

    fn smooth(&mut self, side: HandSide, hand: ClassifiedHand) -> SmoothedHand {
        let states = match self.smoothers.get_mut(side) {
            Some(smoother) => smoother.push(hand.raw.states),
            None => hand.raw.states,
        };
        debug!(%side, raw = ?hand.raw.states, smoothed = ?states, "hand smoothed");
        SmoothedHand { hand, states }
    }

    fn hand_report(&self, smoothed: &SmoothedHand, zone: Option<FretZone>) -> HandReport {
        let side = smoothed.hand.side;
        HandReport {
            side,
            finger_states: smoothed.states,
            extended_count: smoothed.states.extended_count(),
            gesture: smoothed.states.gesture_label(),
            string: match side {
                HandSide::Left => self.mapping.current_string,
                _ => None,
            },
            fret: match side {
                HandSide::Right => self.mapping.current_fret,
                _ => None,
            },
            zone,
            bounding_box: smoothed.hand.observation.bounding_box(),
            confidence: smoothed.hand.raw.confidence,
        }
    }
}

fn control_input(smoothed: &SmoothedHand) -> HandControlInput {
    HandControlInput {
        states: smoothed.states,
        wrist_y: smoothed.hand.observation.wrist_y(),
    }
}

/// Log and report a failed audio request; true when it succeeded
fn record_failure(
    events: &mut Vec<ControlEvent>,
    action: &'static str,
    result: Result<(), AudioError>,
) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            warn!(action, error = %e, "audio request failed");
            events.push(ControlEvent::PlaybackFailed {
                reason: e.to_string(),
            });
            false
        }
    }
}
