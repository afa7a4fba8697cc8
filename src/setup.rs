//! Interactive first-run setup wizard (`hark setup`)

use std::path::PathBuf;

use dialoguer::{Input, Select};

use crate::config::file::{self, ApiKeysFileConfig, HarkConfigFile, VoiceFileConfig};
use crate::intent::DEFAULT_WAKE_WORD;

const STT_PROVIDERS: [(&str, &str); 2] = [("Whisper (OpenAI)", "whisper"), ("Deepgram", "deepgram")];

const TTS_PROVIDERS: [(&str, &str); 3] = [
    ("System voice (say / espeak)", "system"),
    ("OpenAI", "openai"),
    ("ElevenLabs", "elevenlabs"),
];

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
pub fn run_setup() -> anyhow::Result<()> {
    println!("Hark Setup\n");

    // Load existing config if present
    let existing = file::load_config_file();
    let config_path = file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/hark/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    // 1. Wake word
    let wake_word: String = Input::new()
        .with_prompt("Wake word")
        .default(
            existing
                .wake_word
                .clone()
                .unwrap_or_else(|| DEFAULT_WAKE_WORD.to_string()),
        )
        .interact_text()?;

    let mut api_keys = existing.api_keys;

    // 2. Speech recognition
    let stt_idx = select_provider("Speech recognition", &STT_PROVIDERS, existing.voice.stt_provider.as_deref())?;
    let stt_provider = STT_PROVIDERS[stt_idx].1;
    prompt_key(stt_provider, &mut api_keys)?;

    // 3. Speech output
    let tts_idx = select_provider("Speech output", &TTS_PROVIDERS, existing.voice.tts_provider.as_deref())?;
    let tts_provider = TTS_PROVIDERS[tts_idx].1;

    let mut voice = VoiceFileConfig {
        stt_provider: Some(stt_provider.to_string()),
        tts_provider: Some(tts_provider.to_string()),
        ..existing.voice
    };

    if tts_provider == "system" {
        let system_voice: String = Input::new()
            .with_prompt("System voice name (blank for the default)")
            .default(voice.system_voice.clone().unwrap_or_default())
            .allow_empty(true)
            .interact_text()?;
        voice.system_voice = Some(system_voice).filter(|v| !v.is_empty());
    } else {
        prompt_key(tts_provider, &mut api_keys)?;

        let default_voice = voice.tts_voice.clone().unwrap_or_else(|| {
            if tts_provider == "openai" { "alloy" } else { "" }.to_string()
        });
        let tts_voice: String = Input::new()
            .with_prompt("TTS voice")
            .default(default_voice)
            .allow_empty(true)
            .interact_text()?;
        voice.tts_voice = Some(tts_voice).filter(|v| !v.is_empty());
    }

    // 4. Build and write config
    let config_file = HarkConfigFile {
        wake_word: Some(wake_word.trim().to_lowercase()),
        listen: existing.listen,
        voice,
        encyclopedia: existing.encyclopedia,
        api_keys,
    };

    file::write_config_file(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());

    println!("\nSetup complete! Run `hark -v` to start, or `hark --keyboard` to type commands.");

    Ok(())
}

/// Pick a provider, defaulting to the configured one
fn select_provider(
    prompt: &str,
    providers: &[(&str, &str)],
    current: Option<&str>,
) -> anyhow::Result<usize> {
    let labels: Vec<&str> = providers.iter().map(|(label, _)| *label).collect();
    let default = current
        .and_then(|c| providers.iter().position(|(_, id)| id.eq_ignore_ascii_case(c)))
        .unwrap_or(0);

    Ok(Select::new()
        .with_prompt(prompt)
        .items(&labels)
        .default(default)
        .interact()?)
}

/// Ask for the API key a provider needs, keeping the stored one on blank input
fn prompt_key(provider: &str, api_keys: &mut ApiKeysFileConfig) -> anyhow::Result<()> {
    let (env_hint, slot) = match provider {
        "whisper" | "openai" => ("OPENAI_API_KEY", &mut api_keys.openai),
        "deepgram" => ("DEEPGRAM_API_KEY", &mut api_keys.deepgram),
        "elevenlabs" => ("ELEVENLABS_API_KEY", &mut api_keys.elevenlabs),
        _ => return Ok(()),
    };

    let prompt = match slot.as_deref() {
        Some(current) => format!("{env_hint} (current: {}, leave blank to keep)", mask_key(current)),
        None => env_hint.to_string(),
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    if !input.trim().is_empty() {
        *slot = Some(input.trim().to_string());
    }

    Ok(())
}

/// Show only the ends of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}
