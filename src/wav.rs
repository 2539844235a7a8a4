//! Offline rendering of a noise type to a WAV file.

use crate::config::{Coefficients, ConfigError, EngineConfig};
use crate::noise::NoiseType;
use crate::rt::Renderer;
use crate::sink::Interleaved;
use crate::state::SharedState;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Frames per render call when writing files.
pub const OFFLINE_BLOCK_FRAMES: usize = 512;

/// Longest render a WAV data chunk can hold: 8 bytes per stereo f32 frame,
/// chunk size stored as `u32`.
pub const MAX_WAV_FRAMES: u64 = (u32::MAX / 8) as u64;

#[derive(Debug, Error)]
pub enum WavError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("invalid WAV duration {seconds} s: must be finite, non-negative and fit one file")]
    InvalidDuration { seconds: f32 },
    #[error("WAV write failed: {0}")]
    Hound(#[from] hound::Error),
}

/// Render `seconds` of `noise` at `volume` and write it as 32-bit float stereo.
///
/// Uses a private [`SharedState`], so it never disturbs a live engine.
/// Blocks are streamed to the file as they are rendered.
pub fn render_to_wav(
    config: &EngineConfig,
    noise: NoiseType,
    volume: f32,
    seconds: f32,
    path: impl AsRef<Path>,
) -> Result<usize, WavError> {
    config.validate()?;
    let frames = duration_frames(seconds, config.sample_rate)?;
    let shared = Arc::new(SharedState::new(config));
    shared.set_noise(noise);
    shared.set_volume(volume);
    let renderer = Renderer::new(shared, Coefficients::from_config(config));

    let spec = WavSpec {
        channels: 2,
        sample_rate: config.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path.as_ref(), spec)?;
    let mut block = [0.0f32; OFFLINE_BLOCK_FRAMES * 2];
    let mut remaining = frames;
    while remaining > 0 {
        let n = remaining.min(OFFLINE_BLOCK_FRAMES);
        renderer.render(n, &mut Interleaved::new(&mut block[..n * 2]));
        for &sample in &block[..n * 2] {
            writer.write_sample(sample)?;
        }
        remaining -= n;
    }
    writer.finalize()?;

    info!(%noise, frames, path = %path.as_ref().display(), "rendered noise to WAV");
    Ok(frames)
}

fn duration_frames(seconds: f32, sample_rate: u32) -> Result<usize, WavError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(WavError::InvalidDuration { seconds });
    }
    let frames = (f64::from(seconds) * f64::from(sample_rate)) as u64;
    if frames > MAX_WAV_FRAMES {
        return Err(WavError::InvalidDuration { seconds });
    }
    usize::try_from(frames).map_err(|_| WavError::InvalidDuration { seconds })
}
