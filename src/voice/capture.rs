//! Microphone capture
//!
//! [`Microphone`] keeps one input stream open for the life of the listener
//! and collects mono 16 kHz samples from it. A phrase is read in two steps:
//! measure the ambient level, then feed fresh audio to a [`SpeechSegmenter`]
//! until it reports the phrase complete.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleRate, Stream};
use tokio::time::Instant;

use super::endpoint::{SegmenterState, SpeechSegmenter, calibrate_threshold};
use crate::{Error, Result};

/// Capture rate expected by the STT services
pub const SAMPLE_RATE: u32 = 16000;

/// How often pending audio is handed to the segmenter
const CHUNK_INTERVAL: Duration = Duration::from_millis(100);

/// Slack past timeout + phrase limit before a stalled recording is cut off
const STALL_GRACE: Duration = Duration::from_secs(1);

/// Outcome of waiting for one phrase
#[derive(Debug, Clone, PartialEq)]
pub enum Recording {
    /// The phrase, possibly cut short if the device stopped delivering audio
    Phrase(Vec<f32>),
    /// Nothing rose above the ambient level before the timeout
    Silence,
}

/// Default input device, downmixed to mono
pub struct Microphone {
    pending: Arc<Mutex<Vec<f32>>>,
    healthy: Arc<AtomicBool>,
    _stream: Stream,
}

impl Microphone {
    /// Open the default input device and start recording
    ///
    /// Prefers a mono config; multi-channel input is averaged down.
    ///
    /// # Errors
    ///
    /// Returns error if no device can record at 16 kHz or the stream fails
    /// to start
    pub fn open() -> Result<Self> {
        let device = cpal::default_host()
            .default_input_device()
            .ok_or_else(|| Error::Audio("no input device available".to_string()))?;

        let config = device
            .supported_input_configs()
            .map_err(|e| Error::Audio(e.to_string()))?
            .filter(|c| {
                c.min_sample_rate() <= SampleRate(SAMPLE_RATE)
                    && c.max_sample_rate() >= SampleRate(SAMPLE_RATE)
            })
            .min_by_key(cpal::SupportedStreamConfigRange::channels)
            .ok_or_else(|| Error::Audio(format!("input device cannot record at {SAMPLE_RATE} Hz")))?
            .with_sample_rate(SampleRate(SAMPLE_RATE))
            .config();
        let channels = usize::from(config.channels.max(1));

        let pending = Arc::new(Mutex::new(Vec::new()));
        let healthy = Arc::new(AtomicBool::new(true));

        let stream = {
            let pending = Arc::clone(&pending);
            let healthy = Arc::clone(&healthy);

            device
                .build_input_stream(
                    &config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        if let Ok(mut buf) = pending.lock() {
                            buf.extend(downmix(data, channels));
                        }
                    },
                    move |err| {
                        tracing::error!(error = %err, "microphone stream error");
                        healthy.store(false, Ordering::Relaxed);
                    },
                    None,
                )
                .map_err(|e| Error::Audio(e.to_string()))?
        };
        stream.play().map_err(|e| Error::Audio(e.to_string()))?;

        tracing::debug!(
            device = device.name().unwrap_or_default(),
            channels,
            sample_rate = SAMPLE_RATE,
            "microphone open"
        );

        Ok(Self {
            pending,
            healthy,
            _stream: stream,
        })
    }

    /// False once the device has reported a stream error
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Relaxed)
    }

    /// Take everything recorded since the last drain
    #[must_use]
    pub fn drain(&self) -> Vec<f32> {
        self.pending
            .lock()
            .map(|mut buf| std::mem::take(&mut *buf))
            .unwrap_or_default()
    }

    /// Listen to the room for `window` and derive a speech threshold
    ///
    /// Audio recorded before the call is discarded first.
    pub async fn ambient_threshold(&self, window: Duration) -> f32 {
        drop(self.drain());
        if !window.is_zero() {
            tokio::time::sleep(window).await;
        }

        let threshold = calibrate_threshold(&self.drain());
        tracing::debug!(threshold, "adjusted for ambient noise");
        threshold
    }

    /// Wait for one phrase louder than `threshold`
    pub async fn record_phrase(
        &self,
        threshold: f32,
        timeout: Duration,
        phrase_limit: Duration,
    ) -> Recording {
        let mut segmenter = SpeechSegmenter::new(threshold, phrase_limit);
        tracing::info!(threshold = segmenter.threshold(), "listening");

        segment(|| self.drain(), &mut segmenter, timeout, phrase_limit).await
    }
}

/// Feed chunks to `segmenter` every [`CHUNK_INTERVAL`] until a phrase ends
///
/// Gives up with [`Recording::Silence`] if speech has not started within
/// `timeout`, and returns whatever was heard once the stall deadline passes.
async fn segment<F>(
    mut next_chunk: F,
    segmenter: &mut SpeechSegmenter,
    timeout: Duration,
    phrase_limit: Duration,
) -> Recording
where
    F: FnMut() -> Vec<f32>,
{
    let started = Instant::now();
    let stall_deadline = started + timeout + phrase_limit + STALL_GRACE;

    loop {
        tokio::time::sleep(CHUNK_INTERVAL).await;

        if segmenter.process(&next_chunk()) == SegmenterState::Complete {
            break;
        }

        let now = Instant::now();
        if !segmenter.has_speech() && now >= started + timeout {
            return Recording::Silence;
        }
        if now >= stall_deadline {
            tracing::warn!("capture stalled, cutting phrase short");
            break;
        }
    }

    Recording::Phrase(segmenter.take_phrase())
}

/// Average interleaved frames down to one channel
#[allow(clippy::cast_precision_loss)]
fn downmix(data: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    let scale = 1.0 / channels.max(1) as f32;
    data.chunks(channels.max(1))
        .map(move |frame| frame.iter().sum::<f32>() * scale)
}

/// Encode mono samples as 16-bit PCM WAV for the STT upload
///
/// # Errors
///
/// Returns error if WAV encoding fails
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> Result<Vec<u8>> {
    let audio = |e: hound::Error| Error::Audio(format!("WAV encode error: {e}"));
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut out = std::io::Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    let mut writer = hound::WavWriter::new(&mut out, spec).map_err(audio)?;
    let mut pcm = writer.get_i16_writer(u32::try_from(samples.len()).unwrap_or(u32::MAX));
    for &sample in samples {
        #[allow(clippy::cast_possible_truncation)]
        pcm.write_sample((sample.clamp(-1.0, 1.0) * f32::from(i16::MAX)) as i16);
    }
    pcm.flush().map_err(audio)?;
    writer.finalize().map_err(audio)?;

    Ok(out.into_inner())
}
