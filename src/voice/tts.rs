//! Text-to-speech (TTS) through hosted APIs

use crate::config::{Config, TtsProvider};
use crate::{Error, Result};

const OPENAI_SPEECH_URL: &str = "https://api.openai.com/v1/audio/speech";
const ELEVENLABS_URL: &str = "https://api.elevenlabs.io/v1/text-to-speech";

/// Requested explicitly; the API otherwise answers with 44.1 kHz MP3
const ELEVENLABS_OUTPUT_FORMAT: &str = "mp3_22050_32";

/// Hosted TTS backend, with its credentials
#[derive(Clone, Debug)]
enum Backend {
    OpenAI { api_key: String },
    ElevenLabs { api_key: String },
}

/// Synthesizes MP3 speech from text
pub struct TextToSpeech {
    client: reqwest::Client,
    backend: Backend,
    voice: String,
    speed: f64,
    model: String,
}

impl TextToSpeech {
    /// Create a TTS client for the configured cloud provider
    ///
    /// # Errors
    ///
    /// Returns error if the provider is not a cloud provider or its API key
    /// is missing
    pub fn from_config(config: &Config) -> Result<Self> {
        let voice = &config.voice;
        let backend = match voice.tts_provider {
            TtsProvider::OpenAI => Backend::OpenAI {
                api_key: require_key(config.api_keys.openai.as_deref(), "OPENAI_API_KEY")?,
            },
            TtsProvider::ElevenLabs => Backend::ElevenLabs {
                api_key: require_key(config.api_keys.elevenlabs.as_deref(), "ELEVENLABS_API_KEY")?,
            },
            TtsProvider::System => {
                return Err(Error::Config(
                    "system TTS does not use a hosted API".to_string(),
                ));
            }
        };

        Ok(Self {
            client: reqwest::Client::new(),
            backend,
            voice: voice.tts_voice.clone(),
            speed: voice.tts_speed,
            model: voice.tts_model.clone(),
        })
    }

    /// Synthesize text to MP3 bytes
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        match &self.backend {
            Backend::OpenAI { api_key } => self.synthesize_openai(api_key, text).await,
            Backend::ElevenLabs { api_key } => self.synthesize_elevenlabs(api_key, text).await,
        }
    }

    async fn synthesize_openai(&self, api_key: &str, text: &str) -> Result<Vec<u8>> {
        #[derive(serde::Serialize)]
        struct SpeechRequest<'a> {
            model: &'a str,
            input: &'a str,
            voice: &'a str,
            speed: f64,
        }

        let request = SpeechRequest {
            model: &self.model,
            input: text,
            voice: &self.voice,
            speed: self.speed,
        };

        let response = self
            .client
            .post(OPENAI_SPEECH_URL)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("OpenAI TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn synthesize_elevenlabs(&self, api_key: &str, text: &str) -> Result<Vec<u8>> {
        let response = self.elevenlabs_request(api_key, text).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Tts(format!("ElevenLabs TTS error {status}: {body}")));
        }

        Ok(response.bytes().await?.to_vec())
    }

    fn elevenlabs_request(&self, api_key: &str, text: &str) -> reqwest::RequestBuilder {
        #[derive(serde::Serialize)]
        struct ElevenLabsRequest<'a> {
            text: &'a str,
            model_id: &'a str,
        }

        self.client
            .post(format!("{ELEVENLABS_URL}/{}", self.voice))
            .query(&[("output_format", ELEVENLABS_OUTPUT_FORMAT)])
            .header("xi-api-key", api_key)
            .json(&ElevenLabsRequest {
                text,
                model_id: &self.model,
            })
    }
}

fn require_key(key: Option<&str>, name: &str) -> Result<String> {
    key.filter(|k| !k.is_empty())
        .map(str::to_string)
        .ok_or_else(|| Error::Config(format!("{name} required for text-to-speech")))
}
