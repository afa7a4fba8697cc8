//! Audio playback to speakers
//!
//! Clips are played at the rate they were decoded at. The output stream is
//! opened per clip; if the device cannot run at the clip's rate the clip is
//! resampled to the device default instead.

use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, SampleRate, StreamConfig};

use crate::{Error, Result};

/// Rate assumed for clips that carry none (matches common TTS output)
pub const DEFAULT_SAMPLE_RATE: u32 = 24000;

/// Extra wait beyond the nominal clip length before giving up on the stream
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Mono samples and the rate they were recorded at
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedAudio {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

/// Plays audio to the default output device
pub struct AudioPlayback {
    device: Device,
}

impl AudioPlayback {
    /// Open the default output device
    ///
    /// # Errors
    ///
    /// Returns error if there is no output device
    pub fn new() -> Result<Self> {
        let device = cpal::default_host()
            .default_output_device()
            .ok_or_else(|| Error::Audio("no output device available".to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            "audio playback initialized"
        );

        Ok(Self { device })
    }

    /// Decode MP3 bytes and play them, blocking until playback finishes
    ///
    /// # Errors
    ///
    /// Returns error if decoding or playback fails
    pub fn play_mp3(&self, mp3_data: &[u8]) -> Result<()> {
        let audio = decode_mp3(mp3_data)?;
        self.play_samples(audio.samples, audio.sample_rate)
    }

    /// Stream config for a clip rate, mono if possible, else the device default
    fn output_config(&self, sample_rate: u32) -> Result<StreamConfig> {
        let supports = |channels: u16| {
            move |c: &cpal::SupportedStreamConfigRange| {
                c.channels() == channels
                    && c.min_sample_rate() <= SampleRate(sample_rate)
                    && c.max_sample_rate() >= SampleRate(sample_rate)
            }
        };

        let exact = self
            .device
            .supported_output_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .find(supports(1))
            .or_else(|| self.device.supported_output_configs().ok()?.find(supports(2)));

        if let Some(range) = exact {
            return Ok(range.with_sample_rate(SampleRate(sample_rate)).config());
        }

        let fallback = self
            .device
            .default_output_config()
            .map_err(|e| Error::Audio(e.to_string()))?;
        tracing::debug!(
            requested = sample_rate,
            device_rate = fallback.sample_rate().0,
            "clip rate unsupported, resampling"
        );
        Ok(fallback.config())
    }

    /// Play mono samples recorded at `sample_rate`, blocking until done
    ///
    /// # Errors
    ///
    /// Returns error if the output stream cannot be built or started
    pub fn play_samples(&self, samples: Vec<f32>, sample_rate: u32) -> Result<()> {
        if samples.is_empty() {
            return Ok(());
        }

        let config = self.output_config(sample_rate)?;
        let device_rate = config.sample_rate.0;
        let samples = if device_rate == sample_rate {
            samples
        } else {
            resample(&samples, sample_rate, device_rate)
        };

        let channels = usize::from(config.channels);
        let sample_count = samples.len();
        let samples = Arc::new(samples);
        let position = Arc::new(AtomicUsize::new(0));
        let finished = Arc::new(AtomicBool::new(false));

        let stream = {
            let samples = Arc::clone(&samples);
            let position = Arc::clone(&position);
            let finished = Arc::clone(&finished);

            self.device
                .build_output_stream(
                    &config,
                    move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                        let mut pos = position.load(Ordering::Relaxed);
                        for frame in data.chunks_mut(channels) {
                            let sample = samples.get(pos).copied().unwrap_or_else(|| {
                                finished.store(true, Ordering::Release);
                                0.0
                            });
                            frame.fill(sample);
                            pos = (pos + 1).min(samples.len());
                        }
                        position.store(pos, Ordering::Relaxed);
                    },
                    |err| {
                        tracing::error!(error = %err, "audio playback error");
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };

        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        let clip = Duration::from_millis((sample_count as u64 * 1000) / u64::from(device_rate.max(1)));
        let deadline = Instant::now() + clip + DRAIN_GRACE;

        while !finished.load(Ordering::Acquire) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(50));
        }

        // Let the device drain its last buffer
        std::thread::sleep(Duration::from_millis(100));

        drop(stream);
        tracing::debug!(samples = sample_count, sample_rate = device_rate, "playback complete");

        Ok(())
    }
}

/// Decode MP3 bytes to mono f32 samples at the stream's own rate
///
/// # Errors
///
/// Returns error if a frame cannot be decoded
pub fn decode_mp3(mp3_data: &[u8]) -> Result<DecodedAudio> {
    let mut decoder = minimp3::Decoder::new(Cursor::new(mp3_data));
    let mut samples = Vec::new();
    let mut sample_rate = None;

    loop {
        let frame = match decoder.next_frame() {
            Ok(frame) => frame,
            Err(minimp3::Error::Eof) => break,
            Err(e) => return Err(Error::Audio(format!("MP3 decode error: {e}"))),
        };

        let rate = u32::try_from(frame.sample_rate).unwrap_or(DEFAULT_SAMPLE_RATE);
        if *sample_rate.get_or_insert(rate) != rate {
            tracing::warn!(rate, "sample rate changed mid-stream");
        }

        if frame.channels == 2 {
            samples.extend(frame.data.chunks(2).map(|pair| {
                let left = f32::from(pair[0]) / 32768.0;
                let right = f32::from(pair.get(1).copied().unwrap_or(pair[0])) / 32768.0;
                f32::midpoint(left, right)
            }));
        } else {
            samples.extend(frame.data.iter().map(|&s| f32::from(s) / 32768.0));
        }
    }

    Ok(DecodedAudio {
        samples,
        sample_rate: sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
    })
}

/// Linear resampling between two rates
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn resample(samples: &[f32], from: u32, to: u32) -> Vec<f32> {
    if from == to || from == 0 || samples.is_empty() {
        return samples.to_vec();
    }

    let ratio = f64::from(from) / f64::from(to);
    let len = (samples.len() as f64 / ratio).round() as usize;
    let last = samples.len() - 1;

    (0..len)
        .map(|i| {
            let at = i as f64 * ratio;
            let index = (at.floor() as usize).min(last);
            let next = (index + 1).min(last);
            let frac = (at - at.floor()) as f32;
            samples[index] + (samples[next] - samples[index]) * frac
        })
        .collect()
}
