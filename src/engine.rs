//! Lifecycle manager and public control API.
//!
//! [`NoiseEngine`] owns the device connection and the control-plane side of
//! [`SharedState`]. It never surfaces device failures to callers of
//! [`play`](NoiseEngine::play), [`stop`](NoiseEngine::stop) or
//! [`set_volume`](NoiseEngine::set_volume): a device that cannot be attached
//! or started leaves the engine silent and [`is_connected`](NoiseEngine::is_connected)
//! false.

use crate::config::{Coefficients, ConfigError, EngineConfig};
use crate::device::{AudioDevice, StreamFormat};
use crate::invariant_ppt::{
    assert_invariant, ATTACH_ONCE, STOP_SETS_OFF, TEARDOWN_ORDERED, TYPE_SWITCH_RESETS_FILTERS,
    VOLUME_CLAMPED,
};
use crate::noise::NoiseType;
use crate::rt::Renderer;
use crate::state::{SharedState, SynthState};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Engine-level state, as seen from audio output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    /// No render source attached to the device.
    Detached,
    /// Attached, transport not running.
    Stopped,
    /// Transport running; the device is pulling buffers.
    Running,
}

/// Procedural ambient-noise engine bound to one output device.
pub struct NoiseEngine<D: AudioDevice> {
    config: EngineConfig,
    coeffs: Coefficients,
    shared: Arc<SharedState>,
    device: D,
    attached: bool,
    running: bool,
    /// Successful attaches since the last detach.
    attach_count: u32,
}

impl<D: AudioDevice> NoiseEngine<D> {
    /// Build an engine and try to attach it to `device`.
    ///
    /// Only an invalid config is an error; if the device refuses the stream
    /// the engine is still returned and retries attachment on the next `play`.
    pub fn new(config: EngineConfig, device: D) -> Result<Self, ConfigError> {
        config.validate()?;
        let coeffs = Coefficients::from_config(&config);
        let shared = Arc::new(SharedState::new(&config));
        let mut engine = Self {
            config,
            coeffs,
            shared,
            device,
            attached: false,
            running: false,
            attach_count: 0,
        };
        engine.prepare();
        Ok(engine)
    }

    /// Attach the render source to the device. Idempotent; returns whether
    /// the device is attached.
    pub fn prepare(&mut self) -> bool {
        if self.attached {
            return true;
        }
        assert_invariant(
            ATTACH_ONCE,
            !self.device.is_attached(),
            "device already holds a render source",
            None,
        );
        let format = StreamFormat::stereo(self.config.sample_rate);
        let renderer = self.renderer();
        match self.device.attach(renderer, format) {
            Ok(()) => {
                self.attached = true;
                self.attach_count += 1;
                assert_invariant(
                    ATTACH_ONCE,
                    self.attach_count == 1 && self.device.is_attached(),
                    "exactly one live attachment",
                    None,
                );
                debug!(sample_rate = format.sample_rate, "render source attached");
                true
            }
            Err(e) => {
                warn!(error = %e, "audio device unavailable; output stays silent");
                false
            }
        }
    }

    /// Select `noise` and make sure the transport is running.
    ///
    /// Switching type while running swaps it in place at the next buffer.
    /// `NoiseType::Off` behaves like [`stop`](Self::stop).
    pub fn play(&mut self, noise: NoiseType) {
        if noise.is_off() {
            self.stop();
            return;
        }
        if let Some(switch) = self.shared.set_noise(noise) {
            let state = switch.state;
            let fresh = SynthState::new([
                state.synth.channels[0].seed,
                state.synth.channels[1].seed,
            ]);
            assert_invariant(
                TYPE_SWITCH_RESETS_FILTERS,
                state.epoch == switch.previous_epoch.wrapping_add(1) && state.synth == fresh,
                "a type switch advances the epoch and starts from zeroed filters",
                Some(noise.name()),
            );
            info!(from = %switch.previous, to = %noise, "noise type selected");
        }
        if self.running || !self.prepare() {
            return;
        }
        match self.device.start() {
            Ok(()) => {
                self.running = true;
                info!(%noise, "noise playback started");
            }
            Err(e) => warn!(error = %e, "audio device failed to start; output stays silent"),
        }
    }

    /// Select `Off` and stop the transport. The device is only told to stop
    /// when it is running.
    pub fn stop(&mut self) {
        self.shared.set_noise(NoiseType::Off);
        if self.running {
            if let Err(e) = self.device.stop() {
                warn!(error = %e, "audio device failed to stop cleanly");
            }
            self.running = false;
            info!("noise playback stopped");
        }
        assert_invariant(
            STOP_SETS_OFF,
            self.shared.noise().is_off() && !self.device.is_running(),
            "after stop the type is off and the transport is idle",
            None,
        );
    }

    /// Set the output gain. Clamped to `[0, 1]`; takes effect at the next buffer.
    pub fn set_volume(&mut self, volume: f32) {
        self.shared.set_volume(volume);
        // Read back what the render plane will see.
        let stored = self.shared.snapshot().volume;
        assert_invariant(
            VOLUME_CLAMPED,
            (0.0..=1.0).contains(&stored),
            "render-visible volume lies in [0, 1]",
            None,
        );
        debug!(requested = volume, stored, "volume set");
    }

    /// Stop the transport, then release the device. Called on drop.
    pub fn shutdown(&mut self) {
        self.stop();
        if self.attached {
            assert_invariant(
                TEARDOWN_ORDERED,
                !self.device.is_running(),
                "transport stops before the device is released",
                None,
            );
            self.device.detach();
            self.attached = false;
            self.attach_count = 0;
            debug!("render source detached");
        }
    }

    /// The type most recently requested, whether or not audio is flowing.
    pub fn requested_noise(&self) -> NoiseType {
        self.shared.noise()
    }

    pub fn volume(&self) -> f32 {
        self.shared.volume()
    }

    /// True while the device transport is running.
    pub fn is_connected(&self) -> bool {
        self.running
    }

    pub fn lifecycle(&self) -> Lifecycle {
        match (self.attached, self.running) {
            (false, _) => Lifecycle::Detached,
            (true, false) => Lifecycle::Stopped,
            (true, true) => Lifecycle::Running,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn shared(&self) -> &Arc<SharedState> {
        &self.shared
    }

    /// A render handle onto this engine's state, e.g. for offline rendering.
    pub fn renderer(&self) -> Renderer {
        Renderer::new(Arc::clone(&self.shared), self.coeffs)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}

impl<D: AudioDevice> Drop for NoiseEngine<D> {
    fn drop(&mut self) {
        // A failed invariant is already unwinding; the device drops with us.
        if std::thread::panicking() {
            return;
        }
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;
    use crate::harness::{DeviceEvent, ManualDevice};

    fn engine() -> NoiseEngine<ManualDevice> {
        NoiseEngine::new(EngineConfig::default(), ManualDevice::new()).unwrap()
    }

    #[test]
    fn construct_is_prepared_and_stopped() {
        let e = engine();
        assert_eq!(e.lifecycle(), Lifecycle::Stopped);
        assert_eq!(e.requested_noise(), NoiseType::Off);
        assert_eq!(e.device().format(), Some(StreamFormat::stereo(44_100)));
    }

    #[test]
    fn prepare_is_idempotent() {
        let mut e = engine();
        assert!(e.prepare());
        assert!(e.prepare());
        assert_eq!(e.device().count(DeviceEvent::Attach), 1);
    }

    #[test]
    fn play_starts_once() {
        let mut e = engine();
        e.play(NoiseType::White);
        e.play(NoiseType::Brown);
        e.play(NoiseType::Brown);
        assert_eq!(e.lifecycle(), Lifecycle::Running);
        assert_eq!(e.device().count(DeviceEvent::Start), 1);
        assert_eq!(e.requested_noise(), NoiseType::Brown);
    }

    #[test]
    fn play_off_stops() {
        let mut e = engine();
        e.play(NoiseType::Rain);
        e.play(NoiseType::Off);
        assert_eq!(e.lifecycle(), Lifecycle::Stopped);
        assert_eq!(e.requested_noise(), NoiseType::Off);
        assert_eq!(e.device().count(DeviceEvent::Stop), 1);
    }

    #[test]
    fn stop_is_idempotent() {
        let mut e = engine();
        e.stop();
        e.play(NoiseType::Wind);
        e.stop();
        e.stop();
        assert_eq!(e.device().count(DeviceEvent::Stop), 1);
    }

    #[test]
    fn start_failure_is_absorbed() {
        let device = ManualDevice::new().failing_start(DeviceError::Start("busy".into()));
        let mut e = NoiseEngine::new(EngineConfig::default(), device).unwrap();
        e.play(NoiseType::White);
        assert!(!e.is_connected());
        assert_eq!(e.lifecycle(), Lifecycle::Stopped);
        assert_eq!(e.requested_noise(), NoiseType::White);

        e.device_mut().clear_start_failure();
        e.play(NoiseType::White);
        assert!(e.is_connected());
    }

    #[test]
    fn missing_format_leaves_engine_detached() {
        let device = ManualDevice::new().with_supported_rate(48_000);
        let mut e = NoiseEngine::new(EngineConfig::default(), device).unwrap();
        assert_eq!(e.lifecycle(), Lifecycle::Detached);
        e.play(NoiseType::Brown);
        assert_eq!(e.lifecycle(), Lifecycle::Detached);
        assert!(!e.is_connected());
        assert_eq!(e.device().count(DeviceEvent::Start), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = EngineConfig {
            sample_rate: 0,
            ..EngineConfig::default()
        };
        assert!(NoiseEngine::new(config, ManualDevice::new()).is_err());
    }

    /// Reports whatever transport state it is told to, regardless of calls.
    #[derive(Default)]
    struct StuckDevice {
        occupied: bool,
        attached: bool,
        stuck_running: bool,
    }

    impl AudioDevice for StuckDevice {
        fn attach(&mut self, _: Renderer, _: StreamFormat) -> Result<(), DeviceError> {
            self.attached = true;
            Ok(())
        }

        fn start(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }

        fn stop(&mut self) -> Result<(), DeviceError> {
            Ok(())
        }

        fn detach(&mut self) {
            self.attached = false;
        }

        fn is_attached(&self) -> bool {
            self.occupied || self.attached
        }

        fn is_running(&self) -> bool {
            self.stuck_running
        }
    }

    #[test]
    #[should_panic(expected = "device already holds a render source")]
    fn attaching_to_an_occupied_device_fails() {
        let device = StuckDevice {
            occupied: true,
            ..StuckDevice::default()
        };
        let _ = NoiseEngine::new(EngineConfig::default(), device);
    }

    #[test]
    #[should_panic(expected = "after stop the type is off and the transport is idle")]
    fn stop_checks_device_transport() {
        let mut e = NoiseEngine::new(EngineConfig::default(), StuckDevice::default()).unwrap();
        e.play(NoiseType::White);
        e.device_mut().stuck_running = true;
        e.stop();
    }

    #[test]
    fn well_behaved_device_passes_teardown_checks() {
        let mut e = NoiseEngine::new(EngineConfig::default(), StuckDevice::default()).unwrap();
        e.play(NoiseType::Rain);
        e.shutdown();
        assert!(!e.device().is_attached());
        assert_eq!(e.lifecycle(), Lifecycle::Detached);
        // Re-attach after a detach is a fresh attachment.
        assert!(e.prepare());
    }

    #[test]
    fn volume_read_back_is_clamped() {
        let mut e = engine();
        e.set_volume(7.0);
        assert_eq!(e.volume(), 1.0);
        e.set_volume(f32::NAN);
        assert_eq!(e.volume(), 0.0);
    }

    #[test]
    fn drop_stops_before_detach() {
        let mut e = engine();
        e.play(NoiseType::White);
        let log = e.device().event_log();
        drop(e);
        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                DeviceEvent::Attach,
                DeviceEvent::Start,
                DeviceEvent::Stop,
                DeviceEvent::Detach
            ]
        );
    }
}
