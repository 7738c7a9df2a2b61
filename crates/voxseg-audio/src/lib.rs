pub mod error;
pub mod resampler;
pub mod wav;

// Public API
pub use error::AudioError;
pub use resampler::{FrameResampler, TARGET_SAMPLE_RATE_HZ};
pub use wav::encode_wav;
