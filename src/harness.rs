//! Host-less device: the caller plays the role of the audio host.
//!
//! [`ManualDevice`] records every lifecycle call and only renders when the
//! caller pumps it, which makes engine behavior observable without audio
//! hardware.

use crate::device::{AudioDevice, DeviceError, StreamFormat};
use crate::rt::{RenderStatus, Renderer};
use crate::sink::Interleaved;
use std::sync::{Arc, Mutex};

/// Lifecycle calls seen by a [`ManualDevice`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceEvent {
    Attach,
    Start,
    Stop,
    Detach,
}

/// A device driven by explicit [`ManualDevice::pump`] calls.
#[derive(Debug, Default)]
pub struct ManualDevice {
    renderer: Option<Renderer>,
    format: Option<StreamFormat>,
    running: bool,
    supported_rate: Option<u32>,
    attach_error: Option<DeviceError>,
    start_error: Option<DeviceError>,
    events: Arc<Mutex<Vec<DeviceEvent>>>,
}

impl ManualDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept this sample rate; anything else is `FormatUnavailable`.
    pub fn with_supported_rate(mut self, rate: u32) -> Self {
        self.supported_rate = Some(rate);
        self
    }

    pub fn failing_attach(mut self, err: DeviceError) -> Self {
        self.attach_error = Some(err);
        self
    }

    pub fn failing_start(mut self, err: DeviceError) -> Self {
        self.start_error = Some(err);
        self
    }

    /// Let subsequent `start` calls succeed.
    pub fn clear_start_failure(&mut self) {
        self.start_error = None;
    }

    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    /// Shared handle to the event log; stays readable after the device is dropped.
    pub fn event_log(&self) -> Arc<Mutex<Vec<DeviceEvent>>> {
        Arc::clone(&self.events)
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn count(&self, event: DeviceEvent) -> usize {
        self.events().iter().filter(|&&e| e == event).count()
    }

    /// Act as the host for one buffer. Returns `None` when the transport is
    /// stopped, in which case `out` is left untouched.
    pub fn pump(&self, out: &mut [f32]) -> Option<RenderStatus> {
        if !self.running {
            return None;
        }
        let renderer = self.renderer.as_ref()?;
        Some(renderer.render(out.len() / 2, &mut Interleaved::new(out)))
    }

    /// Pump `frames` frames into a fresh interleaved buffer; zeros when stopped.
    pub fn pull(&self, frames: usize) -> Vec<f32> {
        let mut out = vec![0.0; frames * 2];
        self.pump(&mut out);
        out
    }

    fn record(&self, event: DeviceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl AudioDevice for ManualDevice {
    fn attach(&mut self, renderer: Renderer, format: StreamFormat) -> Result<(), DeviceError> {
        self.record(DeviceEvent::Attach);
        if let Some(err) = &self.attach_error {
            return Err(err.clone());
        }
        let rate_ok = self.supported_rate.map_or(true, |r| r == format.sample_rate);
        if !rate_ok || format.channels != StreamFormat::STEREO_CHANNELS {
            return Err(DeviceError::FormatUnavailable {
                sample_rate: format.sample_rate,
                channels: format.channels,
            });
        }
        self.renderer = Some(renderer);
        self.format = Some(format);
        Ok(())
    }

    fn start(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceEvent::Start);
        if self.renderer.is_none() {
            return Err(DeviceError::NotAttached);
        }
        if let Some(err) = &self.start_error {
            return Err(err.clone());
        }
        self.running = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.record(DeviceEvent::Stop);
        self.running = false;
        Ok(())
    }

    fn detach(&mut self) {
        self.record(DeviceEvent::Detach);
        self.running = false;
        self.renderer = None;
    }

    fn is_attached(&self) -> bool {
        self.renderer.is_some()
    }

    fn is_running(&self) -> bool {
        self.running
    }
}
