//! TOML configuration file loading
//!
//! Supports `~/.config/hark/config.toml` as a persistent config source.
//! All fields are optional; the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct HarkConfigFile {
    /// Wake token stripped from transcripts (e.g. "alexa")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wake_word: Option<String>,

    /// Capture window settings
    #[serde(default)]
    pub listen: ListenFileConfig,

    /// Speech recognition and synthesis settings
    #[serde(default)]
    pub voice: VoiceFileConfig,

    /// Encyclopedia lookup settings
    #[serde(default)]
    pub encyclopedia: EncyclopediaFileConfig,

    /// API keys for external services
    #[serde(default)]
    pub api_keys: ApiKeysFileConfig,
}

/// Capture window configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ListenFileConfig {
    /// Seconds to wait for speech to start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<f64>,

    /// Maximum phrase length in seconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phrase_time_limit_secs: Option<f64>,

    /// Ambient noise sampling before each capture, in milliseconds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient_calibration_ms: Option<u64>,
}

/// Voice processing configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VoiceFileConfig {
    /// STT provider ("whisper" or "deepgram")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_provider: Option<String>,

    /// STT model (e.g. "whisper-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stt_model: Option<String>,

    /// TTS provider ("system", "openai" or "elevenlabs")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_provider: Option<String>,

    /// TTS model (e.g. "tts-1")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_voice: Option<String>,

    /// TTS speed multiplier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tts_speed: Option<f64>,

    /// Voice name for the system speech command
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_voice: Option<String>,

    /// Speaking rate for the system speech command, in words per minute
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_rate: Option<u32>,
}

/// Encyclopedia configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct EncyclopediaFileConfig {
    /// Wikipedia language edition (e.g. "en")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    /// Sentences per summary
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentences: Option<usize>,
}

/// API keys configuration
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ApiKeysFileConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub openai: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deepgram: Option<String>,
}

/// Load the TOML config file from the standard path
///
/// Returns `HarkConfigFile::default()` if the file doesn't exist or can't be parsed.
#[must_use]
pub fn load_config_file() -> HarkConfigFile {
    config_file_path().map_or_else(HarkConfigFile::default, |path| load_config_file_from(&path))
}

/// Load a TOML config file from an explicit path
///
/// Missing or unparsable files yield defaults.
#[must_use]
pub fn load_config_file_from(path: &Path) -> HarkConfigFile {
    if !path.exists() {
        return HarkConfigFile::default();
    }

    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => {
                tracing::info!(path = %path.display(), "loaded config file");
                config
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "failed to parse config file, using defaults"
                );
                HarkConfigFile::default()
            }
        },
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to read config file"
            );
            HarkConfigFile::default()
        }
    }
}

/// Serialize and write a config file, creating parent directories
///
/// # Errors
///
/// Returns error if the directory or file cannot be written
pub fn write_config_file(path: &Path, config: &HarkConfigFile) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Return the config file path: `~/.config/hark/config.toml`
#[must_use]
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("hark").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_file_from(&dir.path().join("absent.toml"));
        assert!(config.wake_word.is_none());
        assert!(config.voice.stt_provider.is_none());
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "wake_word = \"jarvis\"\n\n[listen]\ntimeout_secs = 3.5\n\n[voice]\ntts_provider = \"openai\"\n",
        )
        .unwrap();

        let config = load_config_file_from(&path);
        assert_eq!(config.wake_word.as_deref(), Some("jarvis"));
        assert_eq!(config.listen.timeout_secs, Some(3.5));
        assert!(config.listen.phrase_time_limit_secs.is_none());
        assert_eq!(config.voice.tts_provider.as_deref(), Some("openai"));
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "wake_word = [not valid").unwrap();

        let config = load_config_file_from(&path);
        assert!(config.wake_word.is_none());
    }

    #[test]
    fn test_write_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = HarkConfigFile {
            wake_word: Some("computer".to_string()),
            ..HarkConfigFile::default()
        };
        config.encyclopedia.sentences = Some(2);
        config.api_keys.openai = Some("sk-test".to_string());
        write_config_file(&path, &config).unwrap();

        let loaded = load_config_file_from(&path);
        assert_eq!(loaded.wake_word.as_deref(), Some("computer"));
        assert_eq!(loaded.encyclopedia.sentences, Some(2));
        assert_eq!(loaded.api_keys.openai.as_deref(), Some("sk-test"));
        assert!(loaded.api_keys.deepgram.is_none());
    }
}
