//! Audio constants shared across the VAD pipeline

/// Sample rate the speech models operate at (Hz)
pub const SAMPLE_RATE_HZ: u32 = 16_000;

/// Canonical frame size for the Silero v5 model (samples)
/// At 16kHz, 512 samples = 32ms frames
pub const FRAME_SIZE_V5: usize = 512;

/// Canonical frame size for the legacy Silero model (samples)
pub const FRAME_SIZE_LEGACY: usize = 1536;
