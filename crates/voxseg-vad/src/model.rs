use async_trait::async_trait;

use crate::types::SpeechProbabilities;

/// Errors a model backend can surface through the trait boundary.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// A stateful frame-level speech classifier.
///
/// Implementations consume one 16 kHz frame per call and return the speech /
/// non-speech probability pair, mutating internal recurrent state as they go.
/// A model instance must not be shared between VAD instances; the recurrent
/// state belongs to exactly one audio stream.
#[async_trait]
pub trait SpeechModel: Send {
    /// Run inference on one frame. Deterministic given (internal state, frame).
    async fn process(&mut self, frame: &[f32]) -> Result<SpeechProbabilities, ModelError>;

    /// Restore inference state to t=0.
    fn reset_state(&mut self);
}
