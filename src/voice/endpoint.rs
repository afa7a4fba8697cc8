//! Phrase endpointing
//!
//! Energy-based detection of where a spoken phrase starts and ends. The
//! threshold is calibrated against ambient noise before each capture.

use std::time::Duration;

use super::capture::SAMPLE_RATE;

/// Lowest energy threshold, used in a quiet room
pub const ENERGY_FLOOR: f32 = 0.03;

/// Speech must be this much louder than the ambient noise floor
const AMBIENT_MARGIN: f32 = 1.5;

/// Minimum voiced duration for a phrase (0.3 seconds at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends a phrase (0.8 seconds at 16kHz)
const END_SILENCE_SAMPLES: usize = 12_800;

/// Progress of the current phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmenterState {
    /// No speech yet
    Waiting,
    /// Speech started, accumulating
    Speaking,
    /// Phrase ended (trailing silence or length limit)
    Complete,
}

/// Splits a sample stream into a single phrase
pub struct SpeechSegmenter {
    threshold: f32,
    max_samples: usize,
    state: SegmenterState,
    speech_buffer: Vec<f32>,
    silence_counter: usize,
}

impl SpeechSegmenter {
    /// Create a segmenter with an energy threshold and a phrase length cap
    #[must_use]
    pub fn new(threshold: f32, phrase_limit: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let max_samples = (phrase_limit.as_secs_f64() * f64::from(SAMPLE_RATE)) as usize;

        tracing::trace!(threshold, max_samples, "speech segmenter initialized");

        Self {
            threshold: threshold.max(ENERGY_FLOOR),
            max_samples: max_samples.max(MIN_SPEECH_SAMPLES),
            state: SegmenterState::Waiting,
            speech_buffer: Vec::new(),
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples and return the resulting state
    pub fn process(&mut self, samples: &[f32]) -> SegmenterState {
        let energy = rms(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            SegmenterState::Waiting => {
                if is_speech {
                    self.state = SegmenterState::Speaking;
                    self.speech_buffer.clear();
                    self.speech_buffer.extend_from_slice(samples);
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech onset");
                }
            }
            SegmenterState::Speaking => {
                self.speech_buffer.extend_from_slice(samples);

                if is_speech {
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                let voiced = self.speech_buffer.len() - self.silence_counter;

                if self.silence_counter > END_SILENCE_SAMPLES {
                    if voiced >= MIN_SPEECH_SAMPLES {
                        tracing::debug!(samples = self.speech_buffer.len(), "phrase complete");
                        self.state = SegmenterState::Complete;
                    } else {
                        tracing::trace!(voiced, "too short, discarding");
                        self.reset();
                    }
                } else if self.speech_buffer.len() >= self.max_samples {
                    tracing::debug!(samples = self.speech_buffer.len(), "phrase length limit reached");
                    self.state = SegmenterState::Complete;
                }
            }
            SegmenterState::Complete => {}
        }

        self.state
    }

    /// Take the recorded phrase and reset for the next one
    pub fn take_phrase(&mut self) -> Vec<f32> {
        let phrase = std::mem::take(&mut self.speech_buffer);
        self.reset();
        phrase
    }

    /// Check if speech has started
    #[must_use]
    pub fn has_speech(&self) -> bool {
        self.state != SegmenterState::Waiting
    }

    /// Get current state
    #[must_use]
    pub const fn state(&self) -> SegmenterState {
        self.state
    }

    /// Get the active energy threshold
    #[must_use]
    pub const fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Reset to waiting
    pub fn reset(&mut self) {
        self.state = SegmenterState::Waiting;
        self.speech_buffer.clear();
        self.silence_counter = 0;
    }
}

/// Derive a speech threshold from a sample of ambient noise
#[must_use]
pub fn calibrate_threshold(ambient: &[f32]) -> f32 {
    (rms(ambient) * AMBIENT_MARGIN).max(ENERGY_FLOOR)
}

/// Calculate RMS energy of audio samples
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
