use async_trait::async_trait;
use ort::session::Session;
use tracing::debug;

use voxseg_vad::{ModelError, SpeechModel, SpeechProbabilities};

use crate::tensor::{self, RecurrentState};
use crate::SileroError;

/// Frame sizes the legacy model accepts at 16kHz.
pub const LEGACY_FRAME_SIZES: [usize; 3] = [512, 1024, 1536];

/// LSTM hidden/cell state size per layer.
const STATE_SIZE: usize = 64;

/// Legacy Silero VAD inference wrapper.
///
/// The older model keeps separate hidden and cell tensors (`h`/`c`, each
/// `[2, 1, 64]`) and is fed plain frames with no context window.
pub struct SileroLegacy {
    session: Session,
    h: RecurrentState,
    c: RecurrentState,
}

impl SileroLegacy {
    /// Load the model from ONNX bytes.
    pub fn from_bytes(model_bytes: &[u8]) -> Result<Self, SileroError> {
        let session = tensor::load_session(model_bytes)?;
        debug!("loaded Silero legacy session ({} bytes)", model_bytes.len());

        Ok(Self {
            session,
            h: RecurrentState::new(STATE_SIZE),
            c: RecurrentState::new(STATE_SIZE),
        })
    }

    fn infer(&mut self, frame: &[f32]) -> Result<f32, SileroError> {
        if !LEGACY_FRAME_SIZES.contains(&frame.len()) {
            return Err(SileroError::InvalidInput(format!(
                "legacy Silero requires one of {:?} samples, got {}",
                LEGACY_FRAME_SIZES,
                frame.len()
            )));
        }

        let input_value = tensor::audio(frame.to_vec())?;
        let sr_value = tensor::sample_rate()?;
        let h_value = self.h.as_tensor()?;
        let c_value = self.c.as_tensor()?;
        let outputs = self.session.run(ort::inputs![
            "input" => input_value,
            "sr" => sr_value,
            "h" => h_value,
            "c" => c_value,
        ])?;

        let (_, probability) = outputs["output"].try_extract_tensor::<f32>()?;
        let (_, hn) = outputs["hn"].try_extract_tensor::<f32>()?;
        let (_, cn) = outputs["cn"].try_extract_tensor::<f32>()?;
        self.h.copy_from("hn", hn)?;
        self.c.copy_from("cn", cn)?;

        Ok(probability.first().copied().unwrap_or(0.0))
    }
}

#[async_trait]
impl SpeechModel for SileroLegacy {
    async fn process(&mut self, frame: &[f32]) -> Result<SpeechProbabilities, ModelError> {
        Ok(SpeechProbabilities::from_speech(self.infer(frame)?))
    }

    fn reset_state(&mut self) {
        self.h.zero();
        self.c.zero();
    }
}
