//! Real-time procedural ambient-noise engine.
//!
//! A control plane ([`engine::NoiseEngine`]) accepts `play`/`stop`/`set_volume`
//! from any thread that owns the engine; a render plane ([`rt::Renderer`])
//! fills stereo buffers on the audio thread. The two meet only at
//! [`state::SharedState`], a spin-locked record the renderer snapshots at the
//! top of each buffer and writes back at the bottom.

pub mod config;
pub mod device;
pub mod engine;
pub mod filter;
#[doc(hidden)]
pub mod harness;
#[doc(hidden)]
pub mod invariant_ppt;
pub mod noise;
pub mod rng;
pub mod rt;
pub mod sink;
pub mod state;
pub mod wav;

pub use config::{ConfigError, EngineConfig};
pub use device::{AudioDevice, DeviceError, StreamFormat};
pub use engine::{Lifecycle, NoiseEngine};
pub use noise::NoiseType;
pub use rt::{RenderStatus, Renderer};
