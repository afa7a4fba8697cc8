//! Voice processing module
//!
//! Handles audio capture, phrase endpointing, transcription, and spoken
//! output. Listeners and speakers are the seams the session loop uses.

mod capture;
mod endpoint;
mod listener;
mod playback;
mod speaker;
mod stt;
mod tts;

pub use capture::{Microphone, Recording, SAMPLE_RATE, encode_wav};
pub use endpoint::{ENERGY_FLOOR, SegmenterState, SpeechSegmenter, calibrate_threshold, rms};
pub use listener::{CaptureFailure, KeyboardListener, Listener, MicrophoneListener};
pub use playback::{AudioPlayback, DEFAULT_SAMPLE_RATE, DecodedAudio, decode_mp3};
pub use speaker::{CloudSpeaker, Speaker, SystemSpeaker, TextSpeaker, speaker_from_config};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
