//! Spoken responses
//!
//! Every speaker echoes its text to stdout before voicing it, so a
//! session is readable without audio.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use super::playback::AudioPlayback;
use super::tts::TextToSpeech;
use crate::config::{Config, TtsProvider};
use crate::{Error, Result};

/// Local speech synthesizers, in order of preference
const SYSTEM_ENGINES: [&str; 3] = ["say", "espeak-ng", "espeak"];

/// Voices text to the user
///
/// Speaking blocks until the audio has finished, so the microphone does not
/// pick up the assistant's own voice.
#[async_trait(?Send)]
pub trait Speaker {
    /// Speak text aloud
    ///
    /// # Errors
    ///
    /// Returns error if synthesis or playback fails
    async fn say(&self, text: &str) -> Result<()>;
}

/// Print the assistant's line to the transcript
fn echo(text: &str) {
    println!("Assistant: {text}");
}

/// Speaks through a local engine (`say` on macOS, `espeak` elsewhere)
pub struct SystemSpeaker {
    program: PathBuf,
    args: Vec<String>,
}

impl SystemSpeaker {
    /// Locate a local speech engine on `PATH`
    ///
    /// # Errors
    ///
    /// Returns error if none of the known engines is installed
    pub fn detect(voice: Option<&str>, rate: u32) -> Result<Self> {
        let (name, program) = SYSTEM_ENGINES
            .iter()
            .find_map(|name| which::which(name).ok().map(|path| (*name, path)))
            .ok_or_else(|| {
                Error::Tts(format!(
                    "no system speech engine found (tried {})",
                    SYSTEM_ENGINES.join(", ")
                ))
            })?;

        tracing::debug!(engine = name, path = %program.display(), "system speech engine");

        Ok(Self {
            program,
            args: engine_args(name, voice, rate),
        })
    }

    /// Full argument list for one utterance; `--` keeps text that starts
    /// with `-` from being read as a flag
    fn command_args<'a>(&'a self, text: &'a str) -> impl Iterator<Item = &'a str> {
        self.args
            .iter()
            .map(String::as_str)
            .chain(["--", text])
    }
}

/// Voice and rate flags for a local engine
fn engine_args(engine: &str, voice: Option<&str>, rate: u32) -> Vec<String> {
    let rate_flag = if engine == "say" { "-r" } else { "-s" };

    let mut args = Vec::new();
    if let Some(voice) = voice.filter(|v| !v.is_empty()) {
        args.push("-v".to_string());
        args.push(voice.to_string());
    }
    args.push(rate_flag.to_string());
    args.push(rate.to_string());
    args
}

#[async_trait(?Send)]
impl Speaker for SystemSpeaker {
    async fn say(&self, text: &str) -> Result<()> {
        echo(text);

        let output = Command::new(&self.program)
            .args(self.command_args(text))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Tts(format!(
                "{} failed: {}",
                self.program.display(),
                stderr.trim()
            )));
        }

        Ok(())
    }
}

/// Speaks through a hosted TTS API and the default output device
pub struct CloudSpeaker {
    tts: TextToSpeech,
}

impl CloudSpeaker {
    /// Create a speaker for the configured cloud provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider's API key is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            tts: TextToSpeech::from_config(config)?,
        })
    }
}

#[async_trait(?Send)]
impl Speaker for CloudSpeaker {
    async fn say(&self, text: &str) -> Result<()> {
        echo(text);

        let audio = self.tts.synthesize(text).await?;
        tracing::debug!(bytes = audio.len(), "speech synthesized");

        tokio::task::spawn_blocking(move || AudioPlayback::new()?.play_mp3(&audio))
            .await
            .map_err(|e| Error::Audio(format!("playback task failed: {e}")))?
    }
}

/// Prints responses without voicing them
pub struct TextSpeaker;

#[async_trait(?Send)]
impl Speaker for TextSpeaker {
    async fn say(&self, text: &str) -> Result<()> {
        echo(text);
        Ok(())
    }
}

/// Build the speaker for the configured TTS provider
///
/// # Errors
///
/// Returns error if the provider cannot be set up
pub fn speaker_from_config(config: &Config) -> Result<Box<dyn Speaker>> {
    let voice = &config.voice;
    match voice.tts_provider {
        TtsProvider::System => Ok(Box::new(SystemSpeaker::detect(
            voice.system_voice.as_deref(),
            voice.system_rate,
        )?)),
        TtsProvider::OpenAI | TtsProvider::ElevenLabs => {
            Ok(Box::new(CloudSpeaker::from_config(config)?))
        }
    }
}
