use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    #[error("sample rate must be > 0")]
    InvalidSampleRate,

    #[error("frame size must be > 0")]
    InvalidFrameSize,

    #[error("WAV encoding error: {0}")]
    Wav(#[from] hound::Error),
}
