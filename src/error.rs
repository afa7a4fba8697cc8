//! Error types for Hark

use thiserror::Error;

/// Result type alias for Hark operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in Hark
///
/// Capture and lookup outcomes have their own types
/// ([`crate::voice::CaptureFailure`], [`crate::services::LookupError`]);
/// anything surfacing as this type during dispatch is unexpected.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio error
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech-to-text error
    #[error("STT error: {0}")]
    Stt(String),

    /// Text-to-speech error
    #[error("TTS error: {0}")]
    Tts(String),

    /// Media lookup or launch error
    #[error("media error: {0}")]
    Media(String),

    /// Joke source error
    #[error("joke error: {0}")]
    Joke(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Config file serialization error
    #[error("toml error: {0}")]
    Toml(#[from] toml::ser::Error),
}
