//! Configuration management for Hark
//!
//! Values are layered env > TOML file > default. Everything is resolved once
//! at process start; nothing is reloaded while the loop runs.

pub mod file;

use std::time::Duration;

use crate::intent::DEFAULT_WAKE_WORD;
use crate::{Error, Result};

use self::file::HarkConfigFile;

/// Seconds to wait for speech before giving up on an iteration
const DEFAULT_LISTEN_TIMEOUT_SECS: f64 = 5.0;

/// Longest phrase recorded per iteration
const DEFAULT_PHRASE_TIME_LIMIT_SECS: f64 = 7.0;

/// Ambient sampling window before each capture
const DEFAULT_AMBIENT_CALIBRATION_MS: u64 = 500;

/// Slightly slower than the usual 200 wpm engine default
const DEFAULT_SYSTEM_RATE: u32 = 190;

/// Hark configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake token stripped before intent matching
    pub wake_word: String,

    /// Capture window
    pub listen: ListenConfig,

    /// Voice configuration
    pub voice: VoiceConfig,

    /// Encyclopedia configuration
    pub encyclopedia: EncyclopediaConfig,

    /// API keys
    pub api_keys: ApiKeys,
}

/// Capture window configuration
#[derive(Debug, Clone, Copy)]
pub struct ListenConfig {
    /// How long to wait for speech to start
    pub timeout: Duration,

    /// Maximum phrase duration
    pub phrase_time_limit: Duration,

    /// Ambient noise sampling before each capture
    pub ambient_calibration: Duration,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs_f64(DEFAULT_LISTEN_TIMEOUT_SECS),
            phrase_time_limit: Duration::from_secs_f64(DEFAULT_PHRASE_TIME_LIMIT_SECS),
            ambient_calibration: Duration::from_millis(DEFAULT_AMBIENT_CALIBRATION_MS),
        }
    }
}

/// Speech-to-text backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SttProvider {
    /// `OpenAI` Whisper
    Whisper,
    /// Deepgram
    Deepgram,
}

impl SttProvider {
    const fn default_model(self) -> &'static str {
        match self {
            Self::Whisper => "whisper-1",
            Self::Deepgram => "nova-2",
        }
    }
}

impl std::str::FromStr for SttProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "whisper" | "openai" => Ok(Self::Whisper),
            "deepgram" => Ok(Self::Deepgram),
            other => Err(Error::Config(format!("unknown STT provider: {other}"))),
        }
    }
}

/// Text-to-speech backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtsProvider {
    /// Local speech command (`say`, `espeak-ng`, `espeak`)
    System,
    /// `OpenAI` TTS
    OpenAI,
    /// `ElevenLabs` TTS
    ElevenLabs,
}

impl std::str::FromStr for TtsProvider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "system" | "local" => Ok(Self::System),
            "openai" => Ok(Self::OpenAI),
            "elevenlabs" => Ok(Self::ElevenLabs),
            other => Err(Error::Config(format!("unknown TTS provider: {other}"))),
        }
    }
}

/// Voice processing configuration
#[derive(Debug, Clone)]
pub struct VoiceConfig {
    /// STT backend
    pub stt_provider: SttProvider,

    /// STT model identifier (e.g. "whisper-1", "nova-2")
    pub stt_model: String,

    /// TTS backend
    pub tts_provider: TtsProvider,

    /// Cloud TTS model (e.g. "tts-1", "`eleven_monolingual_v1`")
    pub tts_model: String,

    /// Cloud TTS voice identifier
    pub tts_voice: String,

    /// Cloud TTS speed multiplier (0.25 to 4.0)
    pub tts_speed: f64,

    /// Voice name for the system speech command
    pub system_voice: Option<String>,

    /// Speaking rate for the system speech command, in words per minute
    pub system_rate: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            stt_provider: SttProvider::Whisper,
            stt_model: SttProvider::Whisper.default_model().to_string(),
            tts_provider: TtsProvider::System,
            tts_model: "tts-1".to_string(),
            tts_voice: "alloy".to_string(),
            tts_speed: 1.0,
            system_voice: None,
            system_rate: DEFAULT_SYSTEM_RATE,
        }
    }
}

/// Encyclopedia lookup configuration
#[derive(Debug, Clone)]
pub struct EncyclopediaConfig {
    /// Wikipedia language edition
    pub language: String,

    /// Sentences per spoken summary
    pub sentences: usize,
}

impl Default for EncyclopediaConfig {
    fn default() -> Self {
        Self {
            language: "en".to_string(),
            sentences: 1,
        }
    }
}

/// API keys for external services
#[derive(Debug, Clone, Default)]
pub struct ApiKeys {
    /// `OpenAI` API key (Whisper and TTS)
    pub openai: Option<String>,

    /// `ElevenLabs` API key (optional TTS)
    pub elevenlabs: Option<String>,

    /// `Deepgram` API key (optional STT)
    pub deepgram: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            wake_word: DEFAULT_WAKE_WORD.to_string(),
            listen: ListenConfig::default(),
            voice: VoiceConfig::default(),
            encyclopedia: EncyclopediaConfig::default(),
            api_keys: ApiKeys::default(),
        }
    }
}

impl Config {
    /// Load configuration from the environment and the standard config file
    ///
    /// # Errors
    ///
    /// Returns error if a provider name or numeric setting is invalid
    pub fn load() -> Result<Self> {
        Self::from_sources(file::load_config_file(), |key| std::env::var(key).ok())
    }

    /// Build configuration from a parsed file and an environment lookup
    ///
    /// # Errors
    ///
    /// Returns error if a provider name or numeric setting is invalid
    pub fn from_sources(fc: HarkConfigFile, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_keys = ApiKeys {
            openai: env("OPENAI_API_KEY").or(fc.api_keys.openai),
            elevenlabs: env("ELEVENLABS_API_KEY").or(fc.api_keys.elevenlabs),
            deepgram: env("DEEPGRAM_API_KEY").or(fc.api_keys.deepgram),
        };

        let wake_word = env("HARK_WAKE_WORD")
            .or(fc.wake_word)
            .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string());

        let defaults = ListenConfig::default();
        let listen = ListenConfig {
            timeout: seconds(fc.listen.timeout_secs, "listen.timeout_secs")?
                .unwrap_or(defaults.timeout),
            phrase_time_limit: seconds(
                fc.listen.phrase_time_limit_secs,
                "listen.phrase_time_limit_secs",
            )?
            .unwrap_or(defaults.phrase_time_limit),
            ambient_calibration: fc
                .listen
                .ambient_calibration_ms
                .map_or(defaults.ambient_calibration, Duration::from_millis),
        };

        let stt_provider = env("HARK_STT_PROVIDER")
            .or(fc.voice.stt_provider)
            .map(|p| p.parse::<SttProvider>())
            .transpose()?
            .unwrap_or(SttProvider::Whisper);
        let tts_provider = env("HARK_TTS_PROVIDER")
            .or(fc.voice.tts_provider)
            .map(|p| p.parse::<TtsProvider>())
            .transpose()?
            .unwrap_or(TtsProvider::System);

        let voice_defaults = VoiceConfig::default();
        let voice = VoiceConfig {
            stt_provider,
            stt_model: env("HARK_STT_MODEL")
                .or(fc.voice.stt_model)
                .unwrap_or_else(|| stt_provider.default_model().to_string()),
            tts_provider,
            tts_model: env("HARK_TTS_MODEL")
                .or(fc.voice.tts_model)
                .unwrap_or_else(|| default_tts_model(tts_provider).to_string()),
            tts_voice: env("HARK_TTS_VOICE")
                .or(fc.voice.tts_voice)
                .unwrap_or(voice_defaults.tts_voice),
            tts_speed: fc.voice.tts_speed.unwrap_or(voice_defaults.tts_speed),
            system_voice: fc.voice.system_voice,
            system_rate: fc.voice.system_rate.unwrap_or(voice_defaults.system_rate),
        };

        let encyclopedia = EncyclopediaConfig {
            language: env("HARK_WIKI_LANG")
                .or(fc.encyclopedia.language)
                .unwrap_or_else(|| "en".to_string()),
            sentences: fc.encyclopedia.sentences.unwrap_or(1).max(1),
        };

        Ok(Self {
            wake_word,
            listen,
            voice,
            encyclopedia,
            api_keys,
        })
    }

    /// API key required by the configured STT provider
    ///
    /// # Errors
    ///
    /// Returns error if the key is not configured
    pub fn stt_api_key(&self) -> Result<&str> {
        let (key, name) = match self.voice.stt_provider {
            SttProvider::Whisper => (&self.api_keys.openai, "OPENAI_API_KEY"),
            SttProvider::Deepgram => (&self.api_keys.deepgram, "DEEPGRAM_API_KEY"),
        };
        key.as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config(format!("{name} required for speech recognition")))
    }
}

const fn default_tts_model(provider: TtsProvider) -> &'static str {
    match provider {
        TtsProvider::ElevenLabs => "eleven_monolingual_v1",
        TtsProvider::OpenAI | TtsProvider::System => "tts-1",
    }
}

fn seconds(value: Option<f64>, field: &str) -> Result<Option<Duration>> {
    value
        .map(|secs| {
            Duration::try_from_secs_f64(secs)
                .ok()
                .filter(|d| !d.is_zero())
                .ok_or_else(|| Error::Config(format!("{field} must be a positive number")))
        })
        .transpose()
}
