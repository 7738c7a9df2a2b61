use async_trait::async_trait;
use ort::session::Session;
use tracing::debug;

use voxseg_vad::{ModelError, SpeechModel, SpeechProbabilities};

use crate::tensor::{self, RecurrentState};
use crate::SileroError;

/// Samples per inference call (32ms at 16kHz).
pub const V5_FRAME_SAMPLES: usize = 512;

/// Context samples the model wants prepended to each frame.
const CONTEXT_SAMPLES: usize = 64;

/// Total model input size: context + frame.
const INPUT_SIZE: usize = CONTEXT_SAMPLES + V5_FRAME_SAMPLES; // 576

/// LSTM hidden state size.
const STATE_SIZE: usize = 128;

/// Silero VAD v5 inference wrapper.
///
/// The recurrent state and the context window both persist across calls and
/// are zeroed by [`SpeechModel::reset_state`].
pub struct SileroV5 {
    session: Session,
    state: RecurrentState,
    /// Model input scratch. The first 64 slots hold the previous frame's
    /// tail (the context window), the rest is overwritten each call.
    input: Vec<f32>,
}

impl SileroV5 {
    /// Load the model from ONNX bytes.
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, SileroError> {
        let session = tensor::load_session(model_bytes)?;
        debug!("loaded Silero v5 session ({} bytes)", model_bytes.len());

        Ok(Self {
            session,
            state: RecurrentState::new(STATE_SIZE),
            input: vec![0.0f32; INPUT_SIZE],
        })
    }

    fn infer(&mut self, frame: &[f32]) -> Result<f32, SileroError> {
        if frame.len() != V5_FRAME_SAMPLES {
            return Err(SileroError::InvalidInput(format!(
                "Silero v5 requires {} samples, got {}",
                V5_FRAME_SAMPLES,
                frame.len()
            )));
        }

        // The context already sits at the front of the scratch buffer, so
        // assembling the model input is a single copy.
        self.input[CONTEXT_SAMPLES..].copy_from_slice(frame);

        let input_value = tensor::audio(self.input.clone())?;
        let state_value = self.state.as_tensor()?;
        let sr_value = tensor::sample_rate()?;
        let outputs = self.session.run(ort::inputs![
            "input" => input_value,
            "state" => state_value,
            "sr" => sr_value,
        ])?;

        let (_, probability) = outputs["output"].try_extract_tensor::<f32>()?;
        let (_, new_state) = outputs["stateN"].try_extract_tensor::<f32>()?;
        self.state.copy_from("stateN", new_state)?;

        // Slide the context window: the next call sees this frame's tail.
        self.input.copy_within(INPUT_SIZE - CONTEXT_SAMPLES.., 0);

        Ok(probability.first().copied().unwrap_or(0.0))
    }
}

#[async_trait]
impl SpeechModel for SileroV5 {
    async fn process(&mut self, frame: &[f32]) -> Result<SpeechProbabilities, ModelError> {
        Ok(SpeechProbabilities::from_speech(self.infer(frame)?))
    }

    fn reset_state(&mut self) {
        self.state.zero();
        self.input[..CONTEXT_SAMPLES].fill(0.0);
    }
}
