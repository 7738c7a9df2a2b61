use std::collections::VecDeque;

use crate::config::{ConfigError, VadConfig};
use crate::types::{SpeechProbabilities, VadEvent, VadState};

/// Frame-level hysteresis state machine.
///
/// Consumes one probability-tagged frame at a time and returns at most one
/// segment event per frame. The processor is synchronous and model-free: the
/// caller runs inference, hands the probabilities in, and resets the model
/// whenever a terminal event comes back.
///
/// Audio retention is bounded: a ring of `pre_speech_pad_frames` frames while
/// listening, plus the in-flight segment accumulator while a segment is open.
pub struct FrameProcessor {
    config: VadConfig,
    state: VadState,
    pre_roll: VecDeque<Vec<f32>>,
    segment: Vec<Vec<f32>>,
    /// Frames with `is_speech >= positive_speech_threshold` since segment start.
    speech_frames: u32,
    redemption_counter: u32,
    /// State to return to if the segment survives redemption.
    redemption_origin: VadState,
}

impl FrameProcessor {
    pub fn new(config: VadConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let pre_roll = VecDeque::with_capacity(config.pre_speech_pad_frames as usize);
        Ok(Self {
            config,
            state: VadState::Idle,
            pre_roll,
            segment: Vec::new(),
            speech_frames: 0,
            redemption_counter: 0,
            redemption_origin: VadState::Speaking,
        })
    }

    pub fn state(&self) -> VadState {
        self.state
    }

    pub fn config(&self) -> &VadConfig {
        &self.config
    }

    /// Discard any buffered audio and start listening from scratch.
    ///
    /// The caller must reset the model alongside this.
    pub fn resume(&mut self) {
        self.clear();
        self.state = VadState::Silence;
    }

    /// Advance the state machine by one frame.
    ///
    /// Frames must be exactly `frame_samples` long; the stream adapter cuts
    /// them that way before inference. Returns the segment event for this
    /// frame, if any. In `Idle` the frame is ignored.
    pub fn process(&mut self, probabilities: SpeechProbabilities, frame: &[f32]) -> Option<VadEvent> {
        debug_assert_eq!(frame.len(), self.config.frame_samples);
        let p = probabilities.is_speech;

        match self.state {
            VadState::Idle => None,

            VadState::Silence => {
                if p >= self.config.positive_speech_threshold {
                    self.begin_segment(frame)
                } else {
                    self.push_pre_roll(frame);
                    None
                }
            }

            VadState::Speaking | VadState::SpeakingConfirmed => {
                if p >= self.config.positive_speech_threshold {
                    self.segment.push(frame.to_vec());
                    self.note_speech_frame()
                } else if p < self.config.negative_speech_threshold {
                    self.enter_redemption(frame)
                } else {
                    // Middle band: the segment stays open, the frame is kept.
                    self.segment.push(frame.to_vec());
                    None
                }
            }

            VadState::Redemption => {
                if p >= self.config.positive_speech_threshold {
                    // Redeemed: cancel the countdown and pick up where we left off.
                    self.segment.push(frame.to_vec());
                    self.state = self.redemption_origin;
                    self.redemption_counter = 0;
                    self.note_speech_frame()
                } else {
                    self.redemption_counter -= 1;
                    if self.redemption_counter == 0 {
                        let event = self.emit_segment();
                        self.state = VadState::Silence;
                        Some(event)
                    } else {
                        self.segment.push(frame.to_vec());
                        None
                    }
                }
            }
        }
    }

    /// Stop listening. Closes any segment in progress per
    /// `submit_user_speech_on_pause`, then goes to `Idle`.
    pub fn pause(&mut self) -> Option<VadEvent> {
        let event = self.close_in_progress();
        self.clear();
        self.state = VadState::Idle;
        event
    }

    /// Close any segment in progress without stopping, e.g. on end of input.
    /// Same emission policy as `pause`, but the processor keeps listening.
    pub fn end_segment(&mut self) -> Option<VadEvent> {
        let event = self.close_in_progress();
        self.clear();
        self.state = VadState::Silence;
        event
    }

    fn begin_segment(&mut self, frame: &[f32]) -> Option<VadEvent> {
        self.segment = self.pre_roll.drain(..).collect();
        self.segment.push(frame.to_vec());
        self.speech_frames = 1;
        self.state = VadState::Speaking;
        Some(VadEvent::SpeechStart)
    }

    fn note_speech_frame(&mut self) -> Option<VadEvent> {
        self.speech_frames = self.speech_frames.saturating_add(1);
        if self.state == VadState::Speaking && self.speech_frames >= self.config.min_speech_frames {
            self.state = VadState::SpeakingConfirmed;
            return Some(VadEvent::SpeechRealStart);
        }
        None
    }

    fn enter_redemption(&mut self, frame: &[f32]) -> Option<VadEvent> {
        if self.config.redemption_frames == 0 {
            // No grace period configured: the first sub-threshold frame ends
            // the segment and is not part of it.
            let event = self.emit_segment();
            self.state = VadState::Silence;
            return Some(event);
        }
        self.segment.push(frame.to_vec());
        self.redemption_origin = self.state;
        self.redemption_counter = self.config.redemption_frames;
        self.state = VadState::Redemption;
        None
    }

    /// Emission decision on redemption exhaustion: a clean end needs
    /// `min_speech_frames` speech frames, anything less is a misfire.
    fn emit_segment(&mut self) -> VadEvent {
        let qualified = self.speech_frames >= self.config.min_speech_frames;
        let frames = std::mem::take(&mut self.segment);
        self.clear();
        if qualified {
            let frame_count = frames.len();
            let mut audio = Vec::with_capacity(frame_count * self.config.frame_samples);
            for f in &frames {
                audio.extend_from_slice(f);
            }
            VadEvent::SpeechEnd { audio, frame_count }
        } else {
            VadEvent::Misfire
        }
    }

    fn close_in_progress(&mut self) -> Option<VadEvent> {
        if !self.state.in_speech() {
            return None;
        }
        let qualified = self.speech_frames >= self.config.min_speech_frames;
        if qualified && !self.config.submit_user_speech_on_pause {
            // Accumulated speech is discarded by configuration.
            return None;
        }
        Some(self.emit_segment())
    }

    fn push_pre_roll(&mut self, frame: &[f32]) {
        if self.config.pre_speech_pad_frames == 0 {
            return;
        }
        while self.pre_roll.len() >= self.config.pre_speech_pad_frames as usize {
            self.pre_roll.pop_front();
        }
        self.pre_roll.push_back(frame.to_vec());
    }

    fn clear(&mut self) {
        self.pre_roll.clear();
        self.segment.clear();
        self.speech_frames = 0;
        self.redemption_counter = 0;
    }
}
