//! Engine configuration and the filter coefficients derived from it.

use crate::filter::alpha_for_cutoff;
use crate::invariant_ppt::{assert_invariant, COEFFS_FINITE};
use std::f32::consts::TAU;
use thiserror::Error;

/// Fixed device rate the engine targets.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
/// Left channel PRNG seed.
pub const DEFAULT_SEED_LEFT: u32 = 0x1234_5678;
/// Right channel PRNG seed.
pub const DEFAULT_SEED_RIGHT: u32 = 0x8765_4321;

/// Errors raised while validating an [`EngineConfig`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("sample rate must be positive")]
    ZeroSampleRate,
    #[error("{name} cutoff {value} Hz must be finite and inside (0, {nyquist}) Hz")]
    CutoffOutOfRange {
        name: &'static str,
        value: f32,
        nyquist: f32,
    },
    #[error("rain modulation frequency {0} Hz must be finite and positive")]
    InvalidModulation(f32),
    #[error("default volume {0} must be inside [0, 1]")]
    InvalidVolume(f32),
}

/// Immutable engine parameters. Validated once, never mutated after the
/// engine is built.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub sample_rate: u32,
    /// White noise smoothing cutoff.
    pub white_cutoff_hz: f32,
    /// Rain texture cutoff.
    pub rain_cutoff_hz: f32,
    /// Rain amplitude modulation rate.
    pub rain_mod_hz: f32,
    /// Upper edge of the wind band ("low" pass by role).
    pub wind_fast_cutoff_hz: f32,
    /// Lower edge of the wind band ("high" pass by role).
    pub wind_slow_cutoff_hz: f32,
    /// Per-channel seeds, `[left, right]`.
    pub seeds: [u32; 2],
    pub default_volume: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            white_cutoff_hz: 4_000.0,
            rain_cutoff_hz: 1_200.0,
            rain_mod_hz: 0.5,
            wind_fast_cutoff_hz: 2_000.0,
            wind_slow_cutoff_hz: 200.0,
            seeds: [DEFAULT_SEED_LEFT, DEFAULT_SEED_RIGHT],
            default_volume: 0.5,
        }
    }
}

impl EngineConfig {
    /// Start a builder from the defaults.
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder {
            config: Self::default(),
        }
    }

    /// Check every field against its legal range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_rate == 0 {
            return Err(ConfigError::ZeroSampleRate);
        }
        let nyquist = self.sample_rate as f32 / 2.0;
        let cutoffs = [
            ("white", self.white_cutoff_hz),
            ("rain", self.rain_cutoff_hz),
            ("wind fast", self.wind_fast_cutoff_hz),
            ("wind slow", self.wind_slow_cutoff_hz),
        ];
        for (name, value) in cutoffs {
            if !value.is_finite() || value <= 0.0 || value >= nyquist {
                return Err(ConfigError::CutoffOutOfRange {
                    name,
                    value,
                    nyquist,
                });
            }
        }
        if !self.rain_mod_hz.is_finite() || self.rain_mod_hz <= 0.0 {
            return Err(ConfigError::InvalidModulation(self.rain_mod_hz));
        }
        if !(0.0..=1.0).contains(&self.default_volume) {
            return Err(ConfigError::InvalidVolume(self.default_volume));
        }
        Ok(())
    }
}

/// Builder for [`EngineConfig`].
#[derive(Debug, Clone)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    pub fn sample_rate(mut self, rate: u32) -> Self {
        self.config.sample_rate = rate;
        self
    }

    pub fn white_cutoff(mut self, hz: f32) -> Self {
        self.config.white_cutoff_hz = hz;
        self
    }

    pub fn rain_cutoff(mut self, hz: f32) -> Self {
        self.config.rain_cutoff_hz = hz;
        self
    }

    pub fn rain_modulation(mut self, hz: f32) -> Self {
        self.config.rain_mod_hz = hz;
        self
    }

    /// Wind band edges: `fast` is the upper edge, `slow` the lower.
    pub fn wind_band(mut self, fast_hz: f32, slow_hz: f32) -> Self {
        self.config.wind_fast_cutoff_hz = fast_hz;
        self.config.wind_slow_cutoff_hz = slow_hz;
        self
    }

    pub fn seeds(mut self, left: u32, right: u32) -> Self {
        self.config.seeds = [left, right];
        self
    }

    pub fn default_volume(mut self, volume: f32) -> Self {
        self.config.default_volume = volume;
        self
    }

    /// Validate and return the config.
    pub fn build(self) -> Result<EngineConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }
}

/// Per-sample constants derived from an [`EngineConfig`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub white_alpha: f32,
    pub rain_alpha: f32,
    pub wind_fast_alpha: f32,
    pub wind_slow_alpha: f32,
    /// Rain phase advance per frame, radians.
    pub rain_phase_step: f32,
}

impl Coefficients {
    pub fn from_config(config: &EngineConfig) -> Self {
        let rate = config.sample_rate as f32;
        let coeffs = Self {
            white_alpha: alpha_for_cutoff(config.white_cutoff_hz, rate),
            rain_alpha: alpha_for_cutoff(config.rain_cutoff_hz, rate),
            wind_fast_alpha: alpha_for_cutoff(config.wind_fast_cutoff_hz, rate),
            wind_slow_alpha: alpha_for_cutoff(config.wind_slow_cutoff_hz, rate),
            rain_phase_step: TAU * config.rain_mod_hz / rate,
        };
        assert_invariant(
            COEFFS_FINITE,
            coeffs.all_finite(),
            "derived coefficients must be finite",
            Some("Coefficients::from_config"),
        );
        coeffs
    }

    fn all_finite(&self) -> bool {
        [
            self.white_alpha,
            self.rain_alpha,
            self.wind_fast_alpha,
            self.wind_slow_alpha,
            self.rain_phase_step,
        ]
        .iter()
        .all(|c| c.is_finite())
    }
}
