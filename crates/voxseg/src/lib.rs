//! Streaming voice activity detection.
//!
//! Feed arbitrary chunks of mono audio into a [`StreamVad`] and receive a
//! stream of events: one `FrameProcessed` per model frame plus segment
//! boundaries (`SpeechStart`, `SpeechRealStart`, `SpeechEnd` with the
//! segment audio, `Misfire` for starts that never ripened). Input at any
//! sample rate is normalized to 16 kHz internally.
//!
//! The crate is audio-source agnostic: microphones, files and sockets are
//! the caller's business, as is downmixing to mono.
//!
//! ```no_run
//! use tokio::sync::mpsc;
//! use voxseg::{StreamVad, VadConfig, VadEvent};
//! use voxseg::silero::SileroV5;
//!
//! # async fn run(model_bytes: &[u8]) -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, mut rx) = mpsc::channel(64);
//! let model = SileroV5::from_bytes(model_bytes)?;
//! let mut vad = StreamVad::new(model, VadConfig::v5(), tx)?;
//! vad.start()?;
//! vad.process_audio(&vec![0.0f32; 4096]).await?;
//! while let Ok(event) = rx.try_recv() {
//!     if let VadEvent::SpeechEnd { audio, .. } = event {
//!         let _wav = voxseg::encode_wav(&audio, 16_000)?;
//!         // hand the WAV bytes to a transcriber, disk, ...
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod stream;

pub use error::StreamError;
pub use stream::StreamVad;

// Re-export the pipeline building blocks so callers can depend on this
// crate alone.
pub use voxseg_audio::{encode_wav, AudioError, FrameResampler, TARGET_SAMPLE_RATE_HZ};
pub use voxseg_vad::{
    ConfigError, FrameProcessor, ModelError, SpeechModel, SpeechProbabilities, VadConfig,
    VadEvent, VadMetrics, VadState,
};

#[cfg(feature = "silero")]
pub use voxseg_silero as silero;
