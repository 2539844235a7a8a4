//! Render state shared between the control plane and the render plane.
//!
//! The only cross-thread resource in the engine. Guarded by a spin lock
//! whose critical sections are a handful of loads and stores; the render
//! plane never spins for more than [`SNAPSHOT_SPIN_LIMIT`] attempts.

use crate::config::EngineConfig;
use crate::filter::sanitize;
use crate::noise::NoiseType;
use spin::Mutex;

/// Maximum `try_lock` attempts the render plane makes before giving up on
/// a buffer.
pub const SNAPSHOT_SPIN_LIMIT: usize = 1024;

/// Per-channel PRNG seed and filter memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelState {
    pub seed: u32,
    pub white_lp: f32,
    pub rain_lp: f32,
    pub brown: f32,
    pub wind_integrator: f32,
    pub wind_fast: f32,
    pub wind_slow: f32,
}

impl ChannelState {
    pub fn new(seed: u32) -> Self {
        Self {
            seed,
            white_lp: 0.0,
            rain_lp: 0.0,
            brown: 0.0,
            wind_integrator: 0.0,
            wind_fast: 0.0,
            wind_slow: 0.0,
        }
    }

    /// Zero all filter memory. The seed is kept.
    pub fn reset_filters(&mut self) {
        *self = Self::new(self.seed);
    }

    fn sanitize(&mut self) {
        self.white_lp = sanitize(self.white_lp);
        self.rain_lp = sanitize(self.rain_lp);
        self.brown = sanitize(self.brown);
        self.wind_integrator = sanitize(self.wind_integrator);
        self.wind_fast = sanitize(self.wind_fast);
        self.wind_slow = sanitize(self.wind_slow);
    }

    pub fn is_finite(&self) -> bool {
        [
            self.white_lp,
            self.rain_lp,
            self.brown,
            self.wind_integrator,
            self.wind_fast,
            self.wind_slow,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}

/// Everything the render plane evolves from buffer to buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SynthState {
    /// `[left, right]`.
    pub channels: [ChannelState; 2],
    /// Rain modulation phase in `[0, 2π)`, shared by both channels.
    pub rain_phase: f32,
}

impl SynthState {
    pub fn new(seeds: [u32; 2]) -> Self {
        Self {
            channels: [ChannelState::new(seeds[0]), ChannelState::new(seeds[1])],
            rain_phase: 0.0,
        }
    }

    pub fn reset_filters(&mut self) {
        for ch in &mut self.channels {
            ch.reset_filters();
        }
        self.rain_phase = 0.0;
    }

    /// Flush denormals and replace non-finite memory with zero.
    pub fn sanitize(&mut self) {
        for ch in &mut self.channels {
            ch.sanitize();
        }
        self.rain_phase = sanitize(self.rain_phase);
    }

    pub fn is_finite(&self) -> bool {
        self.rain_phase.is_finite() && self.channels.iter().all(ChannelState::is_finite)
    }
}

/// The full record behind the lock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderState {
    pub noise: NoiseType,
    /// Linear gain in `[0, 1]`.
    pub volume: f32,
    /// Bumped on every type change; a render write-back carrying an older
    /// epoch is discarded.
    pub epoch: u64,
    pub synth: SynthState,
}

impl RenderState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            noise: NoiseType::Off,
            volume: clamp_volume(config.default_volume),
            epoch: 0,
            synth: SynthState::new(config.seeds),
        }
    }

    /// True when the render plane can skip synthesis entirely.
    pub fn is_silent(&self) -> bool {
        self.noise.is_off() || self.volume <= 0.0
    }
}

/// Clamp a requested volume into `[0, 1]`; NaN maps to silence.
pub fn clamp_volume(volume: f32) -> f32 {
    if volume.is_nan() {
        0.0
    } else {
        volume.clamp(0.0, 1.0)
    }
}

/// Outcome of a real type change made by [`SharedState::set_noise`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeSwitch {
    pub previous: NoiseType,
    pub previous_epoch: u64,
    /// The record as it stood right after the change.
    pub state: RenderState,
}

/// Lock-guarded [`RenderState`], shared through an `Arc`.
#[derive(Debug)]
pub struct SharedState {
    inner: Mutex<RenderState>,
}

impl SharedState {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            inner: Mutex::new(RenderState::new(config)),
        }
    }

    // --- render plane ---

    /// Copy the whole record out, spinning at most [`SNAPSHOT_SPIN_LIMIT`]
    /// times. `None` means the lock stayed contended.
    #[inline]
    pub fn try_snapshot(&self) -> Option<RenderState> {
        for _ in 0..SNAPSHOT_SPIN_LIMIT {
            if let Some(guard) = self.inner.try_lock() {
                return Some(*guard);
            }
            std::hint::spin_loop();
        }
        None
    }

    /// Write evolved synthesis state back. Only applied when `epoch` still
    /// matches; type and volume are never touched from this side.
    #[inline]
    pub fn commit(&self, epoch: u64, synth: &SynthState) -> bool {
        let mut synth = *synth;
        synth.sanitize();
        for _ in 0..SNAPSHOT_SPIN_LIMIT {
            if let Some(mut guard) = self.inner.try_lock() {
                if guard.epoch != epoch {
                    return false;
                }
                guard.synth = synth;
                return true;
            }
            std::hint::spin_loop();
        }
        false
    }

    // --- control plane ---

    /// Switch the noise type. A real change zeroes filter memory and bumps
    /// the epoch; `None` if `noise` was already selected.
    pub fn set_noise(&self, noise: NoiseType) -> Option<TypeSwitch> {
        let mut guard = self.inner.lock();
        if guard.noise == noise {
            return None;
        }
        let previous = guard.noise;
        let previous_epoch = guard.epoch;
        guard.noise = noise;
        guard.epoch = guard.epoch.wrapping_add(1);
        guard.synth.reset_filters();
        Some(TypeSwitch {
            previous,
            previous_epoch,
            state: *guard,
        })
    }

    /// Store a clamped volume and return the stored value.
    pub fn set_volume(&self, volume: f32) -> f32 {
        let volume = clamp_volume(volume);
        self.inner.lock().volume = volume;
        volume
    }

    pub fn noise(&self) -> NoiseType {
        self.inner.lock().noise
    }

    pub fn volume(&self) -> f32 {
        self.inner.lock().volume
    }

    /// Copy of the full record, for diagnostics and tests.
    pub fn snapshot(&self) -> RenderState {
        *self.inner.lock()
    }

    /// Hold the lock as a stalled control thread would.
    #[cfg(test)]
    pub(crate) fn lock_for_test(&self) -> spin::MutexGuard<'_, RenderState> {
        self.inner.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shared() -> SharedState {
        SharedState::new(&EngineConfig::default())
    }

    #[test]
    fn starts_off_with_zeroed_memory() {
        let state = shared().snapshot();
        assert_eq!(state.noise, NoiseType::Off);
        assert_eq!(state.volume, 0.5);
        assert_eq!(state.synth, SynthState::new([0x1234_5678, 0x8765_4321]));
        assert!(state.is_silent());
    }

    #[test]
    fn volume_is_clamped() {
        let s = shared();
        assert_eq!(s.set_volume(2.0), 1.0);
        assert_eq!(s.set_volume(-3.0), 0.0);
        assert_eq!(s.set_volume(f32::NAN), 0.0);
        assert_eq!(s.set_volume(0.3), 0.3);
        assert_eq!(s.volume(), 0.3);
    }

    #[test]
    fn type_change_resets_filters_and_bumps_epoch() {
        let s = shared();
        s.set_noise(NoiseType::Brown);
        let mut synth = s.snapshot().synth;
        synth.channels[0].brown = 0.4;
        synth.channels[0].seed = 99;
        synth.rain_phase = 1.0;
        assert!(s.commit(1, &synth));

        let switch = s.set_noise(NoiseType::Wind).unwrap();
        assert_eq!(switch.previous, NoiseType::Brown);
        assert_eq!(switch.previous_epoch, 1);
        let after = switch.state;
        assert_eq!(after, s.snapshot());
        assert_eq!(after.epoch, 2);
        assert_eq!(after.synth.channels[0].brown, 0.0);
        assert_eq!(after.synth.rain_phase, 0.0);
        assert_eq!(after.synth.channels[0].seed, 99);
    }

    #[test]
    fn same_type_is_not_a_change() {
        let s = shared();
        assert!(s.set_noise(NoiseType::Rain).is_some());
        assert!(s.set_noise(NoiseType::Rain).is_none());
        assert_eq!(s.snapshot().epoch, 1);
    }

    #[test]
    fn stale_commit_is_discarded() {
        let s = shared();
        s.set_noise(NoiseType::White);
        let taken = s.try_snapshot().unwrap();
        s.set_noise(NoiseType::Rain);
        let mut synth = taken.synth;
        synth.channels[1].rain_lp = 0.7;
        assert!(!s.commit(taken.epoch, &synth));
        assert_eq!(s.snapshot().synth.channels[1].rain_lp, 0.0);
    }

    #[test]
    fn commit_sanitizes() {
        let s = shared();
        let mut synth = s.snapshot().synth;
        synth.channels[0].white_lp = f32::NAN;
        synth.channels[1].wind_slow = 1.0e-38;
        assert!(s.commit(0, &synth));
        let after = s.snapshot().synth;
        assert!(after.is_finite());
        assert_eq!(after.channels[0].white_lp, 0.0);
        assert_eq!(after.channels[1].wind_slow, 0.0);
    }

    #[test]
    fn snapshot_gives_up_while_locked() {
        let s = shared();
        let _held = s.lock_for_test();
        assert!(s.try_snapshot().is_none());
        assert!(!s.commit(0, &SynthState::new([1, 2])));
    }
}
