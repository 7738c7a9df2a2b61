use thiserror::Error;

use voxseg_audio::AudioError;
use voxseg_vad::{ConfigError, ModelError};

#[derive(Error, Debug)]
pub enum StreamError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("audio configuration error: {0}")]
    Audio(#[from] AudioError),

    /// Inference failed for one frame. The frame is lost; the instance and
    /// any in-progress segment remain usable.
    #[error("model inference failed: {0}")]
    Inference(#[source] ModelError),

    #[error("VAD instance already destroyed")]
    Destroyed,

    #[error("event receiver dropped")]
    ChannelClosed,
}
