//! Tensor plumbing shared by both model generations.

use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Tensor;

use voxseg_vad::SAMPLE_RATE_HZ;

use crate::SileroError;

/// Recurrent state carried across inference calls as a `[2, 1, hidden]`
/// tensor. Stored flat so zeroing and copy-back stay trivial.
pub(crate) struct RecurrentState {
    shape: [usize; 3],
    data: Vec<f32>,
}

impl RecurrentState {
    pub(crate) fn new(hidden: usize) -> Self {
        Self {
            shape: [2, 1, hidden],
            data: vec![0.0; 2 * hidden],
        }
    }

    /// Restore to t=0.
    pub(crate) fn zero(&mut self) {
        self.data.fill(0.0);
    }

    pub(crate) fn as_tensor(&self) -> Result<Tensor<f32>, SileroError> {
        Ok(Tensor::from_array((
            self.shape.to_vec(),
            self.data.clone().into_boxed_slice(),
        ))?)
    }

    /// Copy the updated state back from a model output.
    pub(crate) fn copy_from(&mut self, name: &str, values: &[f32]) -> Result<(), SileroError> {
        if values.len() != self.data.len() {
            return Err(SileroError::InvalidInput(format!(
                "{} returned {} state values, expected {}",
                name,
                values.len(),
                self.data.len()
            )));
        }
        self.data.copy_from_slice(values);
        Ok(())
    }
}

/// Build a `[1, len]` audio tensor.
pub(crate) fn audio(samples: Vec<f32>) -> Result<Tensor<f32>, SileroError> {
    let len = samples.len();
    Ok(Tensor::from_array((
        [1usize, len],
        samples.into_boxed_slice(),
    ))?)
}

/// Build the `[1]` sample-rate tensor; every model here runs at 16 kHz.
pub(crate) fn sample_rate() -> Result<Tensor<i64>, SileroError> {
    Ok(Tensor::from_array((
        [1usize],
        vec![SAMPLE_RATE_HZ as i64].into_boxed_slice(),
    ))?)
}

/// Create a session from caller-supplied ONNX bytes.
pub(crate) fn load_session(model_bytes: &[u8]) -> Result<Session, SileroError> {
    Session::builder()
        .and_then(|b| b.with_optimization_level(GraphOptimizationLevel::Level3))
        .and_then(|b| b.with_intra_threads(1))
        .and_then(|b| b.commit_from_memory(model_bytes))
        .map_err(SileroError::ModelLoad)
}
