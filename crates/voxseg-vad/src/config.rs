use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::constants::{FRAME_SIZE_LEGACY, FRAME_SIZE_V5, SAMPLE_RATE_HZ};

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("thresholds must satisfy 0 < negative < positive <= 1, got negative={negative}, positive={positive}")]
    InvalidThresholds { negative: f32, positive: f32 },

    #[error("frame_samples must be > 0")]
    InvalidFrameSize,

    #[error("sample_rate_hz must be > 0")]
    InvalidSampleRate,
}

/// Tuning for the frame-level hysteresis state machine.
///
/// Defaults mirror the deployed Silero v5 settings; `legacy()` switches the
/// frame size to the legacy model's canonical value. Any positive
/// `frame_samples` passes validation -- a value the chosen model cannot accept
/// is rejected by the model itself on the first processed frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VadConfig {
    /// `is_speech >= positive_speech_threshold` enters/continues speech.
    pub positive_speech_threshold: f32,
    /// `is_speech < negative_speech_threshold` starts the redemption countdown.
    pub negative_speech_threshold: f32,
    /// Grace frames below the negative threshold tolerated before end of speech.
    pub redemption_frames: u32,
    /// Frames of pre-roll prepended to each emitted segment.
    pub pre_speech_pad_frames: u32,
    /// Speech frames required for a segment to end cleanly instead of misfiring.
    pub min_speech_frames: u32,
    /// Model input frame size in samples.
    pub frame_samples: usize,
    /// Native input sample rate (Hz); input is resampled when != 16000.
    pub sample_rate_hz: u32,
    /// On pause while speaking, emit the accumulated segment instead of discarding it.
    pub submit_user_speech_on_pause: bool,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self::v5()
    }
}

impl VadConfig {
    pub fn v5() -> Self {
        Self {
            positive_speech_threshold: 0.5,
            negative_speech_threshold: 0.35,
            redemption_frames: 8,
            pre_speech_pad_frames: 1,
            min_speech_frames: 3,
            frame_samples: FRAME_SIZE_V5,
            sample_rate_hz: SAMPLE_RATE_HZ,
            submit_user_speech_on_pause: false,
        }
    }

    pub fn legacy() -> Self {
        Self {
            frame_samples: FRAME_SIZE_LEGACY,
            ..Self::v5()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let (neg, pos) = (
            self.negative_speech_threshold,
            self.positive_speech_threshold,
        );
        if !(neg > 0.0 && neg < pos && pos <= 1.0) {
            return Err(ConfigError::InvalidThresholds {
                negative: neg,
                positive: pos,
            });
        }
        if self.frame_samples == 0 {
            return Err(ConfigError::InvalidFrameSize);
        }
        if self.sample_rate_hz == 0 {
            return Err(ConfigError::InvalidSampleRate);
        }
        Ok(())
    }

    pub fn frame_duration_ms(&self) -> f32 {
        (self.frame_samples as f32 * 1000.0) / SAMPLE_RATE_HZ as f32
    }
}
