pub mod config;
pub mod constants;
pub mod model;
pub mod processor;
pub mod types;

// Core exports - grouped and sorted alphabetically
pub use config::{ConfigError, VadConfig};
pub use constants::{FRAME_SIZE_LEGACY, FRAME_SIZE_V5, SAMPLE_RATE_HZ};
pub use model::{ModelError, SpeechModel};
pub use processor::FrameProcessor;
pub use types::{SpeechProbabilities, VadEvent, VadMetrics, VadState};
