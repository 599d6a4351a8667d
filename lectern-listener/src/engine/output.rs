//! Audio output using cpal
//!
//! Opens an output device and pulls stereo frames from a callback on the
//! device's audio thread, one device buffer per call.

use crate::error::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use std::sync::{Arc, Mutex};
use tracing::{debug, error, info, warn};

/// Preferred output rate when the device supports it
const PREFERRED_SAMPLE_RATE: u32 = 44100;

/// One stereo frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AudioFrame {
    pub left: f32,
    pub right: f32,
}

impl AudioFrame {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn from_stereo(left: f32, right: f32) -> Self {
        Self { left, right }
    }
}

/// Shared volume read by the audio thread
pub type SharedVolume = Arc<Mutex<f32>>;

pub(crate) fn read_volume(volume: &SharedVolume) -> f32 {
    match volume.lock() {
        Ok(v) => *v,
        Err(poisoned) => *poisoned.into_inner(),
    }
}

pub(crate) fn write_volume(volume: &SharedVolume, value: f32) {
    let clamped = value.clamp(0.0, 1.0);
    match volume.lock() {
        Ok(mut v) => *v = clamped,
        Err(poisoned) => *poisoned.into_inner() = clamped,
    }
}

/// Audio output device with an optional running stream
pub struct AudioOutput {
    device: Device,
    config: StreamConfig,
    sample_format: SampleFormat,
    stream: Option<Stream>,
    volume: SharedVolume,
}

impl AudioOutput {
    /// Open `device_name`, or the default device when `None` or not found.
    pub fn open(device_name: Option<&str>, volume: SharedVolume) -> Result<Self> {
        let host = cpal::default_host();

        let named = match device_name {
            Some(name) => {
                let mut devices = host
                    .output_devices()
                    .map_err(|e| Error::AudioOutput(format!("Failed to enumerate devices: {}", e)))?;
                let found = devices.find(|d| d.name().ok().as_deref() == Some(name));
                if found.is_none() {
                    warn!("Requested device '{}' not found, falling back to default device", name);
                }
                found
            }
            None => None,
        };

        let device = match named {
            Some(device) => device,
            None => host
                .default_output_device()
                .ok_or_else(|| Error::AudioOutput("No default output device found".to_string()))?,
        };

        info!(
            "Using audio device: {}",
            device.name().unwrap_or_else(|_| "Unknown".to_string())
        );

        let (config, sample_format) = Self::best_config(&device)?;
        debug!(
            "Audio config: sample_rate={}, channels={}, format={:?}",
            config.sample_rate.0, config.channels, sample_format
        );

        Ok(Self {
            device,
            config,
            sample_format,
            stream: None,
            volume,
        })
    }

    /// Prefer 44.1kHz stereo f32, otherwise the device default.
    fn best_config(device: &Device) -> Result<(StreamConfig, SampleFormat)> {
        let mut supported = device
            .supported_output_configs()
            .map_err(|e| Error::AudioOutput(format!("Failed to get device configs: {}", e)))?;

        let preferred = supported.find(|c| {
            c.channels() == 2
                && c.min_sample_rate().0 <= PREFERRED_SAMPLE_RATE
                && c.max_sample_rate().0 >= PREFERRED_SAMPLE_RATE
                && c.sample_format() == SampleFormat::F32
        });

        if let Some(c) = preferred {
            let sample_format = c.sample_format();
            let config = c
                .with_sample_rate(cpal::SampleRate(PREFERRED_SAMPLE_RATE))
                .config();
            return Ok((config, sample_format));
        }

        let default = device
            .default_output_config()
            .map_err(|e| Error::AudioOutput(format!("Failed to get default config: {}", e)))?;
        Ok((default.config(), default.sample_format()))
    }

    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    /// Start the stream; `fill` runs on the real-time audio thread and
    /// writes every frame of the slice it is given.
    pub fn start<F>(&mut self, fill: F) -> Result<()>
    where
        F: FnMut(&mut [AudioFrame]) + Send + 'static,
    {
        let stream = match self.sample_format {
            SampleFormat::F32 => self.build_stream::<f32, F>(fill)?,
            SampleFormat::I16 => self.build_stream::<i16, F>(fill)?,
            SampleFormat::U16 => self.build_stream::<u16, F>(fill)?,
            other => {
                return Err(Error::AudioOutput(format!(
                    "Unsupported sample format: {:?}",
                    other
                )))
            }
        };

        stream
            .play()
            .map_err(|e| Error::AudioOutput(format!("Failed to start stream: {}", e)))?;
        self.stream = Some(stream);
        info!("Audio stream started");
        Ok(())
    }

    fn build_stream<T, F>(&self, mut fill: F) -> Result<Stream>
    where
        T: SizedSample + FromSample<f32>,
        F: FnMut(&mut [AudioFrame]) + Send + 'static,
    {
        let channels = self.config.channels as usize;
        let volume = Arc::clone(&self.volume);
        // Grows to the largest buffer the device asks for
        let mut scratch: Vec<AudioFrame> = Vec::new();

        self.device
            .build_output_stream(
                &self.config,
                move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
                    let gain = read_volume(&volume);
                    let count = data.len() / channels;
                    if scratch.len() < count {
                        scratch.resize(count, AudioFrame::zero());
                    }
                    let frames = &mut scratch[..count];
                    fill(frames);

                    for (frame, audio) in data.chunks_mut(channels).zip(frames.iter()) {
                        let left = (audio.left * gain).clamp(-1.0, 1.0);
                        let right = (audio.right * gain).clamp(-1.0, 1.0);
                        match frame {
                            [mono] => *mono = T::from_sample((left + right) * 0.5),
                            [l, r, rest @ ..] => {
                                *l = T::from_sample(left);
                                *r = T::from_sample(right);
                                for s in rest {
                                    *s = T::from_sample(0.0f32);
                                }
                            }
                            [] => {}
                        }
                    }
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| Error::AudioOutput(format!("Failed to build stream: {}", e)))
    }

    /// Pause and drop the stream.
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                warn!("Failed to pause stream: {}", e);
            }
            info!("Audio stream stopped");
        }
    }
}

impl Drop for AudioOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
