//! Noise types and the per-type sample renderer.

// IMPORTANT: RT path. Dispatch is a plain match over a closed enum.

use crate::config::Coefficients;
use crate::filter::{leaky_integrate, one_pole};
use crate::state::ChannelState;

/// White noise attenuation after smoothing.
pub const WHITE_GAIN: f32 = 0.75;
/// Leak factor shared by the brown and wind integrators.
pub const INTEGRATOR_LEAK: f32 = 0.02;
/// Loudness restored after integration.
pub const BROWN_GAIN: f32 = 3.5;
/// Rain modulation floor and depth: `RAIN_MOD_BASE + RAIN_MOD_DEPTH·sin(phase)`.
pub const RAIN_MOD_BASE: f32 = 0.88;
pub const RAIN_MOD_DEPTH: f32 = 0.12;
pub const RAIN_GAIN: f32 = 0.7;
pub const WIND_GAIN: f32 = 0.9;

/// The closed set of noise colors the engine can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NoiseType {
    #[default]
    Off,
    White,
    Brown,
    Rain,
    Wind,
}

impl NoiseType {
    pub const ALL: [NoiseType; 5] = [
        NoiseType::Off,
        NoiseType::White,
        NoiseType::Brown,
        NoiseType::Rain,
        NoiseType::Wind,
    ];

    /// Every type except `Off`.
    pub const AUDIBLE: [NoiseType; 4] = [
        NoiseType::White,
        NoiseType::Brown,
        NoiseType::Rain,
        NoiseType::Wind,
    ];

    pub fn is_off(self) -> bool {
        self == NoiseType::Off
    }

    pub fn name(self) -> &'static str {
        match self {
            NoiseType::Off => "off",
            NoiseType::White => "white",
            NoiseType::Brown => "brown",
            NoiseType::Rain => "rain",
            NoiseType::Wind => "wind",
        }
    }
}

impl std::fmt::Display for NoiseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for NoiseType {
    type Err = UnknownNoiseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NoiseType::ALL
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownNoiseType(s.to_string()))
    }
}

/// Returned when parsing an unrecognised noise name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown noise type '{0}'")]
pub struct UnknownNoiseType(pub String);

/// Rain amplitude envelope for the current phase.
#[inline]
pub fn rain_modulation(phase: f32) -> f32 {
    RAIN_MOD_BASE + RAIN_MOD_DEPTH * phase.sin()
}

/// Render one channel's sample from a fresh `raw` value in `[-1, 1]`.
///
/// Updates only the memory belonging to `noise`. The result is *not*
/// clamped or volume-scaled; the callback does both.
#[inline]
pub fn render_sample(
    noise: NoiseType,
    raw: f32,
    ch: &mut ChannelState,
    coeffs: &Coefficients,
    rain_mod: f32,
) -> f32 {
    match noise {
        NoiseType::Off => 0.0,
        NoiseType::White => one_pole(&mut ch.white_lp, raw, coeffs.white_alpha) * WHITE_GAIN,
        NoiseType::Brown => leaky_integrate(&mut ch.brown, raw, INTEGRATOR_LEAK) * BROWN_GAIN,
        NoiseType::Rain => {
            one_pole(&mut ch.rain_lp, raw, coeffs.rain_alpha) * rain_mod * RAIN_GAIN
        }
        NoiseType::Wind => {
            let source =
                leaky_integrate(&mut ch.wind_integrator, raw, INTEGRATOR_LEAK) * BROWN_GAIN;
            let fast = one_pole(&mut ch.wind_fast, source, coeffs.wind_fast_alpha);
            let slow = one_pole(&mut ch.wind_slow, source, coeffs.wind_slow_alpha);
            (fast - slow) * WIND_GAIN
        }
    }
}
