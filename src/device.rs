//! Platform audio device boundary.
//!
//! The engine only needs four things from a device: accept a render source
//! in a given format, start the transport, stop it, and tear down. Any host
//! API (cpal, a test harness, an offline pump) plugs in behind
//! [`AudioDevice`].

use crate::rt::Renderer;
use thiserror::Error;

/// Output stream format the engine requests. Samples are always 32-bit float.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
}

impl StreamFormat {
    pub const STEREO_CHANNELS: u16 = 2;

    pub fn stereo(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            channels: Self::STEREO_CHANNELS,
        }
    }
}

/// Device-side failures. The engine absorbs all of these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("device cannot provide {channels}-channel f32 output at {sample_rate} Hz")]
    FormatUnavailable { sample_rate: u32, channels: u16 },
    #[error("failed to build output stream: {0}")]
    Build(String),
    #[error("failed to start output stream: {0}")]
    Start(String),
    #[error("failed to stop output stream: {0}")]
    Stop(String),
    #[error("no render source attached")]
    NotAttached,
}

/// A platform output device the engine drives.
pub trait AudioDevice {
    /// Attach `renderer` as the stream's render source in `format`.
    /// Called once per engine, again only after a failed attach or a detach.
    fn attach(&mut self, renderer: Renderer, format: StreamFormat) -> Result<(), DeviceError>;

    /// Start invoking the render callback.
    fn start(&mut self) -> Result<(), DeviceError>;

    /// Stop invoking the render callback.
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Release the stream. On return no callback may be in flight.
    fn detach(&mut self);

    /// Whether the device currently holds a render source.
    fn is_attached(&self) -> bool;

    /// Whether the device is invoking the render callback.
    fn is_running(&self) -> bool;
}

#[cfg(feature = "cpal")]
pub use self::cpal_device::CpalDevice;

#[cfg(feature = "cpal")]
mod cpal_device {
    use super::{AudioDevice, DeviceError, StreamFormat};
    use crate::rt::Renderer;
    use crate::sink::Interleaved;
    use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
    use tracing::{debug, error};

    /// Default output device of the default cpal host.
    #[derive(Default)]
    pub struct CpalDevice {
        stream: Option<cpal::Stream>,
        playing: bool,
    }

    impl CpalDevice {
        pub fn new() -> Self {
            Self::default()
        }
    }

    impl AudioDevice for CpalDevice {
        fn attach(&mut self, renderer: Renderer, format: StreamFormat) -> Result<(), DeviceError> {
            let host = cpal::default_host();
            let device = host.default_output_device().ok_or(DeviceError::NoDevice)?;

            let unavailable = DeviceError::FormatUnavailable {
                sample_rate: format.sample_rate,
                channels: format.channels,
            };
            let range = device
                .supported_output_configs()
                .map_err(|_| unavailable.clone())?
                .find(|r| {
                    r.channels() == format.channels
                        && r.sample_format() == cpal::SampleFormat::F32
                        && r.min_sample_rate().0 <= format.sample_rate
                        && format.sample_rate <= r.max_sample_rate().0
                })
                .ok_or(unavailable)?;
            let config = range
                .with_sample_rate(cpal::SampleRate(format.sample_rate))
                .config();

            let channels = format.channels as usize;
            let stream = device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        renderer.render(data.len() / channels, &mut Interleaved::new(data));
                    },
                    |err| error!("Audio stream error: {}", err),
                    None,
                )
                .map_err(|e| DeviceError::Build(e.to_string()))?;
            // Some backends start streams on creation.
            stream
                .pause()
                .map_err(|e| DeviceError::Stop(e.to_string()))?;

            debug!(sample_rate = format.sample_rate, "cpal output stream built");
            self.stream = Some(stream);
            self.playing = false;
            Ok(())
        }

        fn start(&mut self) -> Result<(), DeviceError> {
            let stream = self.stream.as_ref().ok_or(DeviceError::NotAttached)?;
            stream.play().map_err(|e| DeviceError::Start(e.to_string()))?;
            self.playing = true;
            Ok(())
        }

        fn stop(&mut self) -> Result<(), DeviceError> {
            let stream = self.stream.as_ref().ok_or(DeviceError::NotAttached)?;
            // The type is already off by the time the engine stops the
            // device, so a stream whose pause failed only renders silence.
            self.playing = false;
            stream.pause().map_err(|e| DeviceError::Stop(e.to_string()))
        }

        fn detach(&mut self) {
            // Dropping the stream joins the host's callback thread.
            self.stream = None;
            self.playing = false;
        }

        fn is_attached(&self) -> bool {
            self.stream.is_some()
        }

        fn is_running(&self) -> bool {
            self.playing
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stereo_format() {
        let f = StreamFormat::stereo(44_100);
        assert_eq!(f.channels, 2);
        assert_eq!(f.sample_rate, 44_100);
    }

    #[test]
    fn error_messages() {
        let e = DeviceError::FormatUnavailable {
            sample_rate: 44_100,
            channels: 2,
        };
        assert_eq!(
            e.to_string(),
            "device cannot provide 2-channel f32 output at 44100 Hz"
        );
    }
}
