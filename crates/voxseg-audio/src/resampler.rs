use std::cmp::Ordering;

use tracing::info;

use super::error::AudioError;

/// Sample rate every frame leaving the resampler is at (Hz).
pub const TARGET_SAMPLE_RATE_HZ: u32 = 16_000;

/// Streaming resampler that converts arbitrary native rates to 16 kHz and
/// cuts the result into fixed-size frames.
///
/// - Maintains a rolling input buffer so samples spanning call boundaries
///   are preserved; framing across all calls equals framing the
///   concatenated input in one shot
/// - Downsampling is a box filter over the input window mapped to each
///   output sample; 16 kHz input passes through untouched; lower rates are
///   upsampled by linear interpolation
/// - Consumes `ceil(frame_size * native_rate / 16000)` input samples per
///   output frame, retaining any residue for the next call
pub struct FrameResampler {
    native_rate: u32,
    frame_size: usize,
    input_samples_per_frame: usize,
    /// Input samples to output samples, `native_rate / 16000`.
    ratio: f64,
    buffer: Vec<f32>,
}

impl FrameResampler {
    pub fn new(native_rate: u32, frame_size: usize) -> Result<Self, AudioError> {
        if native_rate == 0 {
            return Err(AudioError::InvalidSampleRate);
        }
        if frame_size == 0 {
            return Err(AudioError::InvalidFrameSize);
        }
        let input_samples_per_frame = (frame_size as u64 * native_rate as u64)
            .div_ceil(TARGET_SAMPLE_RATE_HZ as u64) as usize;
        info!(
            native_rate,
            frame_size, input_samples_per_frame, "configured frame resampler"
        );
        Ok(Self {
            native_rate,
            frame_size,
            input_samples_per_frame,
            ratio: native_rate as f64 / TARGET_SAMPLE_RATE_HZ as f64,
            buffer: Vec::with_capacity(input_samples_per_frame * 2),
        })
    }

    /// Append input and return every complete frame it unlocks.
    ///
    /// A zero-length input yields zero frames. Every returned frame is
    /// exactly `frame_size` samples at 16 kHz.
    pub fn process(&mut self, input: &[f32]) -> Vec<Vec<f32>> {
        self.buffer.extend_from_slice(input);

        let mut frames = Vec::with_capacity(self.buffer.len() / self.input_samples_per_frame);
        while self.buffer.len() >= self.input_samples_per_frame {
            let window: Vec<f32> = self.buffer.drain(..self.input_samples_per_frame).collect();
            let frame = match self.native_rate.cmp(&TARGET_SAMPLE_RATE_HZ) {
                Ordering::Equal => window,
                Ordering::Greater => self.box_filter(&window),
                Ordering::Less => self.interpolate(&window),
            };
            debug_assert_eq!(frame.len(), self.frame_size);
            frames.push(frame);
        }
        frames
    }

    /// Samples currently held back waiting for a complete frame.
    pub fn residue_len(&self) -> usize {
        self.buffer.len()
    }

    /// Zero-pad the residue to complete one final frame, if any is buffered.
    ///
    /// Padded samples are ordinary samples as far as downstream consumers are
    /// concerned; the zeros can bias a model toward silence, which is the
    /// accepted trade-off for flushing.
    pub fn flush(&mut self) -> Option<Vec<f32>> {
        if self.buffer.is_empty() {
            return None;
        }
        self.buffer.resize(self.input_samples_per_frame, 0.0);
        self.process(&[]).pop()
    }

    /// Drop any buffered residue.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Downsample one input window by averaging the input samples that map
    /// onto each output index: for output `k`, the window slice from
    /// `floor((k-1) * ratio) + 1` through `floor(k * ratio)` inclusive.
    fn box_filter(&self, window: &[f32]) -> Vec<f32> {
        let mut frame = Vec::with_capacity(self.frame_size);
        for k in 0..self.frame_size {
            let from = if k == 0 {
                0
            } else {
                (((k - 1) as f64 * self.ratio).floor() as usize + 1).min(window.len() - 1)
            };
            let to = ((k as f64 * self.ratio).floor() as usize).min(window.len() - 1);
            let span = &window[from..=to.max(from)];
            frame.push(span.iter().sum::<f32>() / span.len() as f32);
        }
        frame
    }

    /// Upsample one input window by linear interpolation at fractional
    /// positions `k * ratio`.
    fn interpolate(&self, window: &[f32]) -> Vec<f32> {
        let mut frame = Vec::with_capacity(self.frame_size);
        for k in 0..self.frame_size {
            let pos = k as f64 * self.ratio;
            let idx = (pos.floor() as usize).min(window.len() - 1);
            let next = (idx + 1).min(window.len() - 1);
            let frac = (pos - idx as f64) as f32;
            frame.push(window[idx] + frac * (window[next] - window[idx]));
        }
        frame
    }
}
