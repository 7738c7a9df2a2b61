/// Per-frame output of a speech model.
///
/// Only `is_speech` drives the state machine; `not_speech` is carried through
/// for callers that want the full pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeechProbabilities {
    pub is_speech: f32,
    pub not_speech: f32,
}

impl SpeechProbabilities {
    pub fn from_speech(is_speech: f32) -> Self {
        Self {
            is_speech,
            not_speech: 1.0 - is_speech,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VadEvent {
    /// Emitted once for every frame that reaches the state machine.
    FrameProcessed {
        probabilities: SpeechProbabilities,
        frame: Vec<f32>,
    },
    /// A frame crossed the positive threshold while listening.
    SpeechStart,
    /// The segment accumulated `min_speech_frames` speech frames.
    SpeechRealStart,
    /// A segment ended cleanly. `audio` is pre-roll plus every frame seen
    /// since the matching `SpeechStart`, `frame_count` its length in frames.
    SpeechEnd { audio: Vec<f32>, frame_count: usize },
    /// A speech start that never accumulated `min_speech_frames` speech
    /// frames. Callers should drop any partial buffers.
    Misfire,
}

impl VadEvent {
    /// True for the two events that close a segment.
    pub fn is_terminal(&self) -> bool {
        matches!(self, VadEvent::SpeechEnd { .. } | VadEvent::Misfire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VadState {
    /// Not between `resume()` and `pause()`; input is ignored.
    #[default]
    Idle,
    /// Listening, no speech in progress.
    Silence,
    /// Speech started but `min_speech_frames` not yet reached.
    Speaking,
    /// `min_speech_frames` reached; `SpeechRealStart` has fired.
    SpeakingConfirmed,
    /// Counting down grace frames before declaring end of speech.
    Redemption,
}

impl VadState {
    /// True while a segment accumulator exists.
    pub fn in_speech(&self) -> bool {
        matches!(
            self,
            VadState::Speaking | VadState::SpeakingConfirmed | VadState::Redemption
        )
    }
}

/// Counters for a running VAD instance.
#[derive(Debug, Clone, Default)]
pub struct VadMetrics {
    pub frames_processed: u64,
    pub events_emitted: u64,
    pub speech_segments: u64,
    pub misfires: u64,
}
