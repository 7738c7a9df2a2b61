use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, info, trace, warn};

use voxseg_audio::{FrameResampler, TARGET_SAMPLE_RATE_HZ};
use voxseg_vad::{FrameProcessor, SpeechModel, VadConfig, VadEvent, VadMetrics, VadState};

use crate::error::StreamError;

/// How often to log a frame-count summary.
const SUMMARY_INTERVAL_FRAMES: u64 = 1000;

/// Streaming VAD instance: free-form audio chunks in, events out.
///
/// Owns one model, one resampler plan and one frame processor. Audio handed
/// to [`process_audio`](StreamVad::process_audio) is normalized to 16 kHz,
/// cut into model-sized frames and run through the state machine one frame
/// at a time; every event a chunk generates is delivered to the caller's
/// channel before the call returns, in input-sample order.
///
/// An instance belongs to one caller. It starts paused; call
/// [`start`](StreamVad::start) to begin listening.
pub struct StreamVad<M: SpeechModel> {
    model: M,
    processor: FrameProcessor,
    resampler: Option<FrameResampler>,
    /// 16 kHz samples waiting to fill a frame.
    pending: Vec<f32>,
    event_tx: mpsc::Sender<VadEvent>,
    metrics: Arc<RwLock<VadMetrics>>,
    running: bool,
    destroyed: bool,
}

impl<M: SpeechModel> StreamVad<M> {
    /// Create a paused instance. Fails on invalid configuration.
    pub fn new(
        model: M,
        config: VadConfig,
        event_tx: mpsc::Sender<VadEvent>,
    ) -> Result<Self, StreamError> {
        let processor = FrameProcessor::new(config)?;
        let config = processor.config();
        let resampler = if config.sample_rate_hz != TARGET_SAMPLE_RATE_HZ {
            Some(FrameResampler::new(
                config.sample_rate_hz,
                config.frame_samples,
            )?)
        } else {
            None
        };
        info!(
            target: "vad",
            sample_rate_hz = config.sample_rate_hz,
            frame_samples = config.frame_samples,
            resampling = resampler.is_some(),
            "created stream VAD (paused)"
        );

        Ok(Self {
            model,
            processor,
            resampler,
            pending: Vec::new(),
            event_tx,
            metrics: Arc::new(RwLock::new(VadMetrics::default())),
            running: false,
            destroyed: false,
        })
    }

    pub fn state(&self) -> VadState {
        self.processor.state()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Snapshot of the instance counters.
    pub fn metrics(&self) -> VadMetrics {
        self.metrics.read().clone()
    }

    /// Begin (or resume) listening from a clean slate.
    pub fn start(&mut self) -> Result<(), StreamError> {
        self.ensure_alive()?;
        if self.running {
            return Ok(());
        }
        self.running = true;
        self.processor.resume();
        self.model.reset_state();
        info!(target: "vad", "stream started");
        Ok(())
    }

    /// Stop listening. Any segment in progress is closed per
    /// `submit_user_speech_on_pause` and the resulting terminal event, if
    /// any, is delivered before this returns. Samples arriving after the
    /// call are ignored.
    pub async fn pause(&mut self) -> Result<(), StreamError> {
        self.ensure_alive()?;
        if !self.running {
            return Ok(());
        }
        self.running = false;
        // dispatch() resets the model if the processor closed a segment;
        // pausing from Silence leaves the model state alone.
        if let Some(event) = self.processor.pause() {
            self.dispatch(event).await?;
        }
        info!(target: "vad", "stream paused");
        Ok(())
    }

    /// Feed a chunk of mono samples at the configured native rate.
    ///
    /// Ignored while paused. Frames are processed strictly in order, one
    /// model inference at a time; all events generated by this chunk are
    /// delivered before the returned future resolves. On an inference
    /// failure the offending frame is lost but the instance -- including an
    /// in-progress segment -- remains usable.
    pub async fn process_audio(&mut self, chunk: &[f32]) -> Result<(), StreamError> {
        self.ensure_alive()?;
        if !self.running {
            trace!(target: "vad", "ignoring {} samples while paused", chunk.len());
            return Ok(());
        }

        match &mut self.resampler {
            Some(resampler) => {
                for frame in resampler.process(chunk) {
                    self.pending.extend(frame);
                }
            }
            None => self.pending.extend_from_slice(chunk),
        }

        let frame_samples = self.processor.config().frame_samples;
        while self.pending.len() >= frame_samples {
            let frame: Vec<f32> = self.pending.drain(..frame_samples).collect();
            self.run_frame(frame).await?;
        }
        Ok(())
    }

    /// Process any partial frame (zero-padded) and close the current
    /// segment, e.g. at end of input. The instance keeps listening.
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        self.ensure_alive()?;
        if !self.running {
            return Ok(());
        }

        let residue = match &mut self.resampler {
            Some(resampler) => resampler.flush(),
            None => {
                if self.pending.is_empty() {
                    None
                } else {
                    let frame_samples = self.processor.config().frame_samples;
                    self.pending.resize(frame_samples, 0.0);
                    Some(std::mem::take(&mut self.pending))
                }
            }
        };
        if let Some(frame) = residue {
            self.run_frame(frame).await?;
        }

        if let Some(event) = self.processor.end_segment() {
            self.dispatch(event).await?;
        }
        self.pending.clear();
        Ok(())
    }

    /// Drop buffered samples and reset the model; keeps the running/paused
    /// state. Calling it twice is the same as calling it once.
    pub fn reset(&mut self) -> Result<(), StreamError> {
        self.ensure_alive()?;
        self.pending.clear();
        if let Some(resampler) = &mut self.resampler {
            resampler.reset();
        }
        self.model.reset_state();
        if self.running {
            self.processor.resume();
        }
        debug!(target: "vad", "stream reset");
        Ok(())
    }

    /// Pause, discard buffers and retire the instance. Further calls other
    /// than `destroy` fail with [`StreamError::Destroyed`].
    pub async fn destroy(&mut self) -> Result<(), StreamError> {
        if self.destroyed {
            return Ok(());
        }
        self.running = false;
        if let Some(event) = self.processor.pause() {
            // Best effort: the receiver may already be gone during teardown.
            if let Err(err) = self.dispatch(event).await {
                warn!(target: "vad", "discarding terminal event during destroy: {}", err);
            }
        }
        // Teardown reset, same as reset(): buffers and model go back to t=0
        // regardless of whether a terminal event fired above.
        self.pending.clear();
        if let Some(resampler) = &mut self.resampler {
            resampler.reset();
        }
        self.model.reset_state();
        self.destroyed = true;

        let metrics = self.metrics.read();
        info!(
            target: "vad",
            frames = metrics.frames_processed,
            segments = metrics.speech_segments,
            misfires = metrics.misfires,
            "stream VAD destroyed"
        );
        Ok(())
    }

    async fn run_frame(&mut self, frame: Vec<f32>) -> Result<(), StreamError> {
        let probabilities = self
            .model
            .process(&frame)
            .await
            .map_err(StreamError::Inference)?;
        let event = self.processor.process(probabilities, &frame);

        let frames_processed = {
            let mut metrics = self.metrics.write();
            metrics.frames_processed += 1;
            metrics.frames_processed
        };
        if frames_processed % SUMMARY_INTERVAL_FRAMES == 0 {
            debug!(
                target: "vad",
                frames_processed,
                state = ?self.processor.state(),
                "frame summary"
            );
        }

        self.event_tx
            .send(VadEvent::FrameProcessed {
                probabilities,
                frame,
            })
            .await
            .map_err(|_| StreamError::ChannelClosed)?;

        if let Some(event) = event {
            self.dispatch(event).await?;
        }
        Ok(())
    }

    /// Deliver a segment event: update counters, reset the model when a
    /// segment closed, then send.
    async fn dispatch(&mut self, event: VadEvent) -> Result<(), StreamError> {
        {
            let mut metrics = self.metrics.write();
            metrics.events_emitted += 1;
            match &event {
                VadEvent::SpeechEnd { frame_count, .. } => {
                    metrics.speech_segments += 1;
                    debug!(target: "vad", frame_count, "speech segment emitted");
                }
                VadEvent::Misfire => {
                    metrics.misfires += 1;
                    debug!(target: "vad", "misfire");
                }
                _ => {}
            }
        }
        if event.is_terminal() {
            self.model.reset_state();
        }
        self.event_tx
            .send(event)
            .await
            .map_err(|_| StreamError::ChannelClosed)
    }

    fn ensure_alive(&self) -> Result<(), StreamError> {
        if self.destroyed {
            Err(StreamError::Destroyed)
        } else {
            Ok(())
        }
    }
}
