use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};
use std::io::Cursor;

/// Container metadata read back from a WAV (RIFF) file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WavDetails {
    pub channels: u16,
    /// Bytes per sample
    pub sample_width: u16,
    pub frame_rate: u32,
    /// Samples per channel
    pub frame_count: u32,
    pub file_size: u64,
}

impl WavDetails {
    /// Playback length derived from the header
    pub fn duration_ms(&self) -> u64 {
        if self.frame_rate == 0 {
            return 0;
        }
        (self.frame_count as u64 * 1000) / self.frame_rate as u64
    }
}

/// Parse `bytes` as a WAV container and report its header fields.
///
/// The check is structural only: the header must parse and expose a
/// non-zero channel count, sample width and frame rate. Sample data is not
/// decoded.
pub fn inspect_wav(bytes: &[u8]) -> anyhow::Result<WavDetails> {
    let reader = hound::WavReader::new(Cursor::new(bytes))
        .map_err(|e| anyhow::anyhow!("wav parse err: {e}"))?;

    let spec = reader.spec();
    if spec.channels == 0 {
        anyhow::bail!("wav header declares zero channels");
    }
    if spec.bits_per_sample == 0 {
        anyhow::bail!("wav header declares zero bits per sample");
    }
    if spec.sample_rate == 0 {
        anyhow::bail!("wav header declares a zero frame rate");
    }

    Ok(WavDetails {
        channels: spec.channels,
        sample_width: spec.bits_per_sample.div_ceil(8),
        frame_rate: spec.sample_rate,
        frame_count: reader.duration(),
        file_size: bytes.len() as u64,
    })
}

/// Encode PCM f32 samples as mono 16-bit PCM WAV (RIFF) bytes.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> anyhow::Result<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    // WAV header (44 bytes) + samples (2 bytes per sample)
    let mut cursor = Cursor::new(Vec::<u8>::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)
            .map_err(|e| anyhow::anyhow!("wav write err: {e}"))?;

        const I16_MAX_F32: f32 = i16::MAX as f32;
        for &s in samples {
            let v = (s.clamp(-1.0, 1.0) * I16_MAX_F32) as i16;
            writer
                .write_sample(v)
                .map_err(|e| anyhow::anyhow!("wav sample err: {e}"))?;
        }
        writer
            .finalize()
            .map_err(|e| anyhow::anyhow!("wav finalize err: {e}"))?;
    }

    Ok(cursor.into_inner())
}

/// Encode PCM f32 samples as 16-bit PCM WAV and return Base64.
pub fn encode_wav_base64(samples: &[f32], sample_rate: u32) -> anyhow::Result<String> {
    Ok(general_purpose::STANDARD.encode(encode_wav(samples, sample_rate)?))
}

/// Decode an inline Base64 audio payload back to raw bytes.
pub fn decode_base64_audio(encoded: &str) -> anyhow::Result<Vec<u8>> {
    general_purpose::STANDARD
        .decode(encoded.trim())
        .map_err(|e| anyhow::anyhow!("base64 decode err: {e}"))
}
