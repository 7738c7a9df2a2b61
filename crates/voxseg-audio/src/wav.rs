use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::error::AudioError;

/// Encode float samples as an in-memory 16-bit PCM WAV file.
///
/// Samples are clamped to `[-1.0, 1.0]` and scaled by 32767. Mono only, like
/// everything else in the pipeline.
pub fn encode_wav(audio: &[f32], sample_rate: u32) -> Result<Vec<u8>, AudioError> {
    if sample_rate == 0 {
        return Err(AudioError::InvalidSampleRate);
    }

    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut cursor = Cursor::new(Vec::new());
    let mut writer = WavWriter::new(&mut cursor, spec)?;
    for &sample in audio {
        writer.write_sample((sample.clamp(-1.0, 1.0) * 32767.0) as i16)?;
    }
    writer.finalize()?;

    Ok(cursor.into_inner())
}
