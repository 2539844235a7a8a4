//! RT module: the render callback.
//!
//! [`Renderer::render`] is the single entry point the audio host calls once
//! per buffer. It takes the lock twice per buffer (snapshot at the top,
//! write-back at the bottom) and synthesizes entirely from stack-local copies
//! in between.

// IMPORTANT: Nothing reachable from `render` may allocate, log, or block.

use crate::config::Coefficients;
use crate::noise::{render_sample, rain_modulation, NoiseType};
use crate::rng::white_sample;
use crate::sink::{Interleaved, StereoSink};
use crate::state::{ChannelState, SharedState};
use std::f32::consts::TAU;
use std::sync::Arc;

/// What a render call did. Every variant means the buffer was fully written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// Noise was synthesized.
    Rendered,
    /// Type was off or volume zero; the buffer holds silence.
    Silent,
    /// The state lock could not be taken in time; the buffer holds silence.
    Contended,
}

/// The render-plane half of the engine.
#[derive(Debug, Clone)]
pub struct Renderer {
    shared: Arc<SharedState>,
    coeffs: Coefficients,
}

impl Renderer {
    pub fn new(shared: Arc<SharedState>, coeffs: Coefficients) -> Self {
        Self { shared, coeffs }
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coeffs
    }

    /// Render `frames` stereo frames into `out` (capped at its capacity).
    pub fn render<S: StereoSink + ?Sized>(&self, frames: usize, out: &mut S) -> RenderStatus {
        let frames = frames.min(out.frames());
        let Some(snapshot) = self.shared.try_snapshot() else {
            out.silence(frames);
            return RenderStatus::Contended;
        };
        if snapshot.is_silent() {
            out.silence(frames);
            return RenderStatus::Silent;
        }

        let noise = snapshot.noise;
        let volume = snapshot.volume;
        let coeffs = &self.coeffs;
        let mut synth = snapshot.synth;
        let [left, right] = &mut synth.channels;

        for frame in 0..frames {
            let rain_mod = if noise == NoiseType::Rain {
                rain_modulation(synth.rain_phase)
            } else {
                1.0
            };
            let l = channel_sample(noise, left, coeffs, rain_mod) * volume;
            let r = channel_sample(noise, right, coeffs, rain_mod) * volume;
            out.write_frame(frame, l, r);

            if noise == NoiseType::Rain {
                synth.rain_phase += coeffs.rain_phase_step;
                if synth.rain_phase >= TAU {
                    synth.rain_phase -= TAU;
                }
            }
        }

        // A stale epoch means the type changed mid-buffer; the control
        // plane's zeroed memory wins.
        self.shared.commit(snapshot.epoch, &synth);
        RenderStatus::Rendered
    }
}

/// Draw, render, and clamp one channel's sample.
#[inline]
fn channel_sample(
    noise: NoiseType,
    ch: &mut ChannelState,
    coeffs: &Coefficients,
    rain_mod: f32,
) -> f32 {
    let raw = white_sample(&mut ch.seed);
    let sample = render_sample(noise, raw, ch, coeffs, rain_mod);
    if sample.is_finite() {
        sample.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// Run `render` with panic containment.
pub fn render_safe<S: StereoSink + ?Sized>(
    renderer: &Renderer,
    frames: usize,
    out: &mut S,
) -> RenderStatus {
    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        renderer.render(frames, out)
    }));
    match result {
        Ok(status) => status,
        Err(_) => {
            // Fail closed: silence output
            let frames = frames.min(out.frames());
            out.silence(frames);
            RenderStatus::Silent
        }
    }
}

/// Render offline to an interleaved buffer, `block` frames per callback.
///
/// `None` when `frames` is too large to address as interleaved samples.
pub fn render_offline(renderer: &Renderer, frames: usize, block: usize) -> Option<Vec<f32>> {
    let samples = frames.checked_mul(2)?;
    let block_samples = block.max(1).checked_mul(2)?;
    let mut output = vec![0.0; samples];
    for chunk in output.chunks_mut(block_samples) {
        let n = chunk.len() / 2;
        renderer.render(n, &mut Interleaved::new(chunk));
    }
    Some(output)
}
