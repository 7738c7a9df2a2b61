//! Stream orchestrator tests
//!
//! Tests cover:
//! - Chunked audio framing and event ordering end-to-end
//! - Resampler forwarding (frame size and sample-count law)
//! - Flush padding, pause policies, reset/destroy lifecycle
//! - Inference-failure recovery

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;

use voxseg::{
    ModelError, SpeechModel, SpeechProbabilities, StreamError, StreamVad, VadConfig, VadEvent,
};

const FRAME: usize = 512;

/// Replays a queue of probabilities; counts frames, samples and resets.
struct ScriptedModel {
    script: VecDeque<f32>,
    frames_seen: Arc<AtomicUsize>,
    samples_seen: Arc<AtomicUsize>,
    resets: Arc<AtomicUsize>,
    fail_on_call: Option<usize>,
    calls: usize,
}

impl ScriptedModel {
    fn new(script: &[(usize, f32)]) -> Self {
        let mut queue = VecDeque::new();
        for &(count, p) in script {
            for _ in 0..count {
                queue.push_back(p);
            }
        }
        Self {
            script: queue,
            frames_seen: Arc::new(AtomicUsize::new(0)),
            samples_seen: Arc::new(AtomicUsize::new(0)),
            resets: Arc::new(AtomicUsize::new(0)),
            fail_on_call: None,
            calls: 0,
        }
    }

    fn counters(&self) -> (Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        (
            self.frames_seen.clone(),
            self.samples_seen.clone(),
            self.resets.clone(),
        )
    }
}

#[async_trait]
impl SpeechModel for ScriptedModel {
    async fn process(&mut self, frame: &[f32]) -> Result<SpeechProbabilities, ModelError> {
        self.calls += 1;
        if self.fail_on_call == Some(self.calls) {
            return Err("scripted inference failure".into());
        }
        self.frames_seen.fetch_add(1, Ordering::SeqCst);
        self.samples_seen.fetch_add(frame.len(), Ordering::SeqCst);
        let p = self.script.pop_front().unwrap_or(0.1);
        Ok(SpeechProbabilities::from_speech(p))
    }

    fn reset_state(&mut self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

/// Opt-in log output for debugging: `RUST_LOG=vad=trace cargo test`.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn drain(rx: &mut mpsc::Receiver<VadEvent>) -> Vec<VadEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

/// Segment events with the number of `FrameProcessed` events seen before
/// each, i.e. the 1-based frame the event fired on.
fn segment_events(events: &[VadEvent]) -> Vec<(usize, &VadEvent)> {
    let mut fp = 0;
    let mut out = Vec::new();
    for ev in events {
        match ev {
            VadEvent::FrameProcessed { .. } => fp += 1,
            other => out.push((fp, other)),
        }
    }
    out
}

// ─── End-to-end scenarios ────────────────────────────────────────────

#[tokio::test]
async fn clean_speech_over_chunked_audio() {
    init_tracing();
    let model = ScriptedModel::new(&[(2, 0.1), (10, 0.9), (12, 0.1)]);
    let (tx, mut rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();

    // 24 frames of traceable samples, fed in awkward chunk sizes.
    let input: Vec<f32> = (0..24 * FRAME).map(|i| (i % 997) as f32).collect();
    for chunk in input.chunks(700) {
        vad.process_audio(chunk).await.unwrap();
    }

    let events = drain(&mut rx);
    let frame_count = events
        .iter()
        .filter(|e| matches!(e, VadEvent::FrameProcessed { .. }))
        .count();
    assert_eq!(frame_count, 24);

    let segments = segment_events(&events);
    assert_eq!(segments.len(), 3, "segments: {:?}", segments);
    assert!(matches!(segments[0], (3, VadEvent::SpeechStart)));
    assert!(matches!(segments[1], (5, VadEvent::SpeechRealStart)));
    match segments[2] {
        (21, VadEvent::SpeechEnd { audio, frame_count }) => {
            assert_eq!(*frame_count, 19);
            assert_eq!(audio.len(), 9728);
            // Pre-roll frame 2 through the last redemption frame 20.
            assert_eq!(audio[..], input[FRAME..20 * FRAME]);

            // The emitted segment is WAV-encodable as-is.
            let wav = voxseg::encode_wav(audio, 16_000).unwrap();
            assert_eq!(wav.len(), 44 + 9728 * 2);
        }
        other => panic!("expected SpeechEnd at frame 21, got {:?}", other),
    }

    let metrics = vad.metrics();
    assert_eq!(metrics.frames_processed, 24);
    assert_eq!(metrics.speech_segments, 1);
    assert_eq!(metrics.misfires, 0);
}

#[tokio::test]
async fn short_burst_misfires_and_resets_model() {
    let model = ScriptedModel::new(&[(2, 0.1), (2, 0.9), (12, 0.1)]);
    let (_, _, resets) = model.counters();
    let (tx, mut rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();

    vad.process_audio(&vec![0.0; 16 * FRAME]).await.unwrap();

    let events = drain(&mut rx);
    let segments = segment_events(&events);
    assert_eq!(segments.len(), 2);
    assert!(matches!(segments[0], (3, VadEvent::SpeechStart)));
    assert!(matches!(segments[1], (13, VadEvent::Misfire)));

    // Once on start, once when the segment terminated.
    assert_eq!(resets.load(Ordering::SeqCst), 2);
    assert_eq!(vad.metrics().misfires, 1);
}

// ─── Resampling ──────────────────────────────────────────────────────

#[tokio::test]
async fn resampled_input_forwards_exact_frames() {
    init_tracing();
    let model = ScriptedModel::new(&[]);
    let (frames_seen, samples_seen, _) = model.counters();
    let (tx, mut rx) = mpsc::channel(256);
    let config = VadConfig {
        sample_rate_hz: 48_000,
        ..VadConfig::default()
    };
    let mut vad = StreamVad::new(model, config, tx).unwrap();
    vad.start().unwrap();

    // 48kHz noise; 1536 input samples produce one 512-sample model frame.
    let mut seed = 0x9e37_79b9_7f4a_7c15u64;
    let input: Vec<f32> = (0..100_000)
        .map(|_| {
            seed = seed
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            ((seed >> 40) as f32 / (1u64 << 23) as f32) - 1.0
        })
        .collect();
    for chunk in input.chunks(777) {
        vad.process_audio(chunk).await.unwrap();
    }

    let expected_frames = input.len() / 1536;
    assert_eq!(frames_seen.load(Ordering::SeqCst), expected_frames);
    assert_eq!(
        samples_seen.load(Ordering::SeqCst),
        expected_frames * FRAME,
        "model must only ever see whole frames"
    );
    for ev in drain(&mut rx) {
        if let VadEvent::FrameProcessed { frame, .. } = ev {
            assert_eq!(frame.len(), FRAME);
        }
    }
}

// ─── Flush, pause, reset, destroy ────────────────────────────────────

#[tokio::test]
async fn flush_zero_pads_partial_frame_and_closes_segment() {
    let model = ScriptedModel::new(&[(2, 0.9)]);
    let (frames_seen, _, _) = model.counters();
    let (tx, mut rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();

    vad.process_audio(&vec![0.5; FRAME + 100]).await.unwrap();
    assert_eq!(frames_seen.load(Ordering::SeqCst), 1);

    vad.flush().await.unwrap();
    assert_eq!(frames_seen.load(Ordering::SeqCst), 2);

    let events = drain(&mut rx);
    // Padded frame is an ordinary frame to the pipeline.
    let padded = events
        .iter()
        .filter_map(|e| match e {
            VadEvent::FrameProcessed { frame, .. } => Some(frame),
            _ => None,
        })
        .nth(1)
        .expect("two frames processed");
    assert_eq!(&padded[..100], &vec![0.5; 100][..]);
    assert!(padded[100..].iter().all(|&s| s == 0.0));

    // Two speech frames < min_speech_frames: the flush closes as a misfire.
    let segments = segment_events(&events);
    assert!(matches!(segments.last(), Some((_, VadEvent::Misfire))));
    // Still running: later audio is processed normally.
    assert!(vad.is_running());
}

#[tokio::test]
async fn pause_submits_accumulated_speech_when_configured() {
    let model = ScriptedModel::new(&[(5, 0.9)]);
    let (tx, mut rx) = mpsc::channel(256);
    let config = VadConfig {
        submit_user_speech_on_pause: true,
        ..VadConfig::default()
    };
    let mut vad = StreamVad::new(model, config, tx).unwrap();
    vad.start().unwrap();

    vad.process_audio(&vec![0.25; 5 * FRAME]).await.unwrap();
    vad.pause().await.unwrap();

    let events = drain(&mut rx);
    match segment_events(&events).last() {
        Some((5, VadEvent::SpeechEnd { audio, frame_count })) => {
            assert_eq!(*frame_count, 5);
            assert_eq!(audio.len(), 5 * FRAME);
        }
        other => panic!("expected submitted SpeechEnd, got {:?}", other),
    }

    // Paused: further audio is ignored.
    vad.process_audio(&vec![0.25; 4 * FRAME]).await.unwrap();
    assert_eq!(vad.metrics().frames_processed, 5);
}

#[tokio::test]
async fn pause_discards_accumulated_speech_by_default() {
    let model = ScriptedModel::new(&[(5, 0.9)]);
    let (tx, mut rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();

    vad.process_audio(&vec![0.25; 5 * FRAME]).await.unwrap();
    vad.pause().await.unwrap();

    let events = drain(&mut rx);
    assert!(
        segment_events(&events)
            .iter()
            .all(|(_, e)| matches!(e, VadEvent::SpeechStart | VadEvent::SpeechRealStart)),
        "no terminal event expected, got {:?}",
        events
    );
}

#[tokio::test]
async fn reset_drops_pending_samples() {
    let model = ScriptedModel::new(&[]);
    let (frames_seen, _, _) = model.counters();
    let (tx, _rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();

    vad.process_audio(&vec![0.5; 300]).await.unwrap();
    vad.reset().unwrap();
    vad.reset().unwrap(); // reset; reset == reset

    // The 300 buffered samples are gone: 212 more do not complete a frame.
    vad.process_audio(&vec![0.5; 212]).await.unwrap();
    assert_eq!(frames_seen.load(Ordering::SeqCst), 0);

    vad.process_audio(&vec![0.5; FRAME]).await.unwrap();
    assert_eq!(frames_seen.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn destroy_retires_the_instance() {
    let model = ScriptedModel::new(&[(2, 0.9)]);
    let (tx, mut rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();
    vad.process_audio(&vec![0.5; 2 * FRAME]).await.unwrap();

    vad.destroy().await.unwrap();
    // The unripe segment surfaced as a misfire on the way down.
    let events = drain(&mut rx);
    assert!(matches!(
        segment_events(&events).last(),
        Some((_, VadEvent::Misfire))
    ));

    assert!(matches!(
        vad.process_audio(&vec![0.0; FRAME]).await,
        Err(StreamError::Destroyed)
    ));
    assert!(matches!(vad.start(), Err(StreamError::Destroyed)));
    // Destroy is idempotent.
    vad.destroy().await.unwrap();
}

// ─── Failure handling ────────────────────────────────────────────────

#[tokio::test]
async fn inference_failure_loses_one_frame_but_keeps_segment() {
    let mut model = ScriptedModel::new(&[(1, 0.9), (1, 0.9)]);
    model.fail_on_call = Some(2);
    let (frames_seen, _, _) = model.counters();
    let (tx, mut rx) = mpsc::channel(256);
    let mut vad = StreamVad::new(model, VadConfig::default(), tx).unwrap();
    vad.start().unwrap();

    let err = vad.process_audio(&vec![0.5; 3 * FRAME]).await.unwrap_err();
    assert!(matches!(err, StreamError::Inference(_)));
    assert_eq!(frames_seen.load(Ordering::SeqCst), 1);

    // The rest of the chunk is still buffered; the segment survives.
    vad.process_audio(&[]).await.unwrap();
    assert_eq!(frames_seen.load(Ordering::SeqCst), 2);

    let events = drain(&mut rx);
    let segments = segment_events(&events);
    assert_eq!(segments.len(), 1);
    assert!(matches!(segments[0], (1, VadEvent::SpeechStart)));
    assert!(vad.state().in_speech());
}
