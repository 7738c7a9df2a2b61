//! Silero VAD inference backends.
//!
//! Two generations of the model are supported, both loaded from
//! caller-supplied ONNX bytes (there is no automatic download):
//!
//! - [`SileroLegacy`] -- the older LSTM model with separate `h`/`c` state
//!   tensors, accepting 512/1024/1536-sample frames
//! - [`SileroV5`] -- the v5 model with a single `state` tensor and a
//!   64-sample context window, accepting 512-sample frames only
//!
//! Both carry recurrent state across calls, so one instance serves exactly
//! one audio stream.

pub mod legacy;
mod tensor;
pub mod v5;

use thiserror::Error;

pub use legacy::SileroLegacy;
pub use v5::SileroV5;

#[derive(Debug, Error)]
pub enum SileroError {
    #[error("model load error: {0}")]
    ModelLoad(#[source] ort::Error),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("ONNX Runtime error: {0}")]
    Ort(#[from] ort::Error),
}
