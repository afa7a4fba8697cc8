//! Transcript capture
//!
//! A [`Listener`] produces one lowercase transcript per call or a
//! [`CaptureFailure`]. The microphone listener records a single phrase and
//! sends it to STT; the keyboard listener reads a line of text instead.

use std::io::{self, BufRead};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::capture::{Microphone, Recording, SAMPLE_RATE, encode_wav};
use super::stt::SpeechToText;
use crate::config::Config;

/// Why an iteration produced no transcript
///
/// None of these are spoken to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureFailure {
    /// Nothing was said before the listening window closed
    #[error("no speech before timeout")]
    Timeout,

    /// Audio was captured but produced no text
    #[error("could not understand audio")]
    Unintelligible,

    /// The device or the recognition service failed
    #[error("capture service error: {0}")]
    ServiceError(String),
}

/// Source of transcripts
///
/// Implementations may own audio devices that are not `Send`, so the
/// returned future is not required to be either.
#[async_trait(?Send)]
pub trait Listener {
    /// Capture one phrase and return its lowercase transcript
    ///
    /// # Errors
    ///
    /// Returns a [`CaptureFailure`] when no usable transcript was produced
    async fn listen(
        &mut self,
        timeout: Duration,
        phrase_limit: Duration,
    ) -> Result<String, CaptureFailure>;
}

/// Records from the default microphone and transcribes through STT
pub struct MicrophoneListener {
    microphone: Microphone,
    stt: SpeechToText,
    calibration: Duration,
}

impl MicrophoneListener {
    /// Open the microphone and the configured STT provider
    ///
    /// # Errors
    ///
    /// Returns error if the input device cannot be opened or the STT
    /// provider is not configured
    pub fn new(config: &Config) -> crate::Result<Self> {
        let stt = SpeechToText::from_config(config)?;

        Ok(Self {
            microphone: Microphone::open()?,
            stt,
            calibration: config.listen.ambient_calibration,
        })
    }
}

#[async_trait(?Send)]
impl Listener for MicrophoneListener {
    async fn listen(
        &mut self,
        timeout: Duration,
        phrase_limit: Duration,
    ) -> Result<String, CaptureFailure> {
        if !self.microphone.is_healthy() {
            return Err(CaptureFailure::ServiceError("microphone stream failed".into()));
        }

        let threshold = self.microphone.ambient_threshold(self.calibration).await;
        let phrase = match self
            .microphone
            .record_phrase(threshold, timeout, phrase_limit)
            .await
        {
            Recording::Phrase(phrase) => phrase,
            Recording::Silence => return Err(CaptureFailure::Timeout),
        };
        tracing::debug!(samples = phrase.len(), "phrase captured");

        let wav = encode_wav(&phrase, SAMPLE_RATE)
            .map_err(|e| CaptureFailure::ServiceError(e.to_string()))?;
        let text = self
            .stt
            .transcribe(wav)
            .await
            .map_err(|e| CaptureFailure::ServiceError(e.to_string()))?;

        normalize(&text)
    }
}

/// Reads one command per line from a text stream
///
/// Lines are read on a dedicated OS thread and handed over a channel, so a
/// read that never completes does not hold up runtime shutdown. End of input
/// asks the session to shut down, the same as an interrupt.
pub struct KeyboardListener {
    lines: mpsc::Receiver<io::Result<String>>,
    shutdown: mpsc::Sender<()>,
    closed: bool,
}

impl KeyboardListener {
    /// Read commands from standard input
    ///
    /// # Errors
    ///
    /// Returns error if the reader thread cannot be spawned
    pub fn stdin(shutdown: mpsc::Sender<()>) -> crate::Result<Self> {
        Self::from_reader(io::BufReader::new(io::stdin()), shutdown)
    }

    /// Read commands from any blocking reader
    ///
    /// # Errors
    ///
    /// Returns error if the reader thread cannot be spawned
    pub fn from_reader<R>(reader: R, shutdown: mpsc::Sender<()>) -> crate::Result<Self>
    where
        R: BufRead + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(1);

        std::thread::Builder::new()
            .name("hark-input".into())
            .spawn(move || {
                for line in reader.lines() {
                    let failed = line.is_err();
                    if tx.blocking_send(line).is_err() || failed {
                        break;
                    }
                }
                tracing::debug!("input reader finished");
            })?;

        Ok(Self::new(rx, shutdown))
    }

    /// Take lines from an existing channel; a closed channel is end of input
    #[must_use]
    pub const fn new(
        lines: mpsc::Receiver<io::Result<String>>,
        shutdown: mpsc::Sender<()>,
    ) -> Self {
        Self {
            lines,
            shutdown,
            closed: false,
        }
    }
}

#[async_trait(?Send)]
impl Listener for KeyboardListener {
    async fn listen(
        &mut self,
        timeout: Duration,
        _phrase_limit: Duration,
    ) -> Result<String, CaptureFailure> {
        if self.closed {
            return Err(CaptureFailure::Timeout);
        }

        match tokio::time::timeout(timeout, self.lines.recv()).await {
            Err(_) => Err(CaptureFailure::Timeout),
            Ok(Some(Ok(line))) => normalize(&line),
            Ok(Some(Err(e))) => Err(CaptureFailure::ServiceError(e.to_string())),
            Ok(None) => {
                tracing::info!("input closed");
                self.closed = true;
                let _ = self.shutdown.try_send(());
                Err(CaptureFailure::Timeout)
            }
        }
    }
}

/// Lowercase and trim a raw transcript; empty means unintelligible
fn normalize(raw: &str) -> Result<String, CaptureFailure> {
    let transcript = raw.trim().to_lowercase();
    if transcript.is_empty() {
        return Err(CaptureFailure::Unintelligible);
    }

    tracing::info!(transcript = %transcript, "heard");
    Ok(transcript)
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};
    use std::time::Instant;

    use super::*;

    const WINDOW: Duration = Duration::from_secs(5);

    struct Detached;

    impl Read for Detached {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::other("terminal detached"))
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Alexa, What Time "), Ok("alexa, what time".to_string()));
        assert_eq!(normalize("   "), Err(CaptureFailure::Unintelligible));
    }

    #[tokio::test]
    async fn test_keyboard_lines() {
        let (tx, mut rx) = mpsc::channel(1);
        let input = Cursor::new(b"Alexa Play Jazz\n\nwho is ada lovelace\n".to_vec());
        let mut listener = KeyboardListener::from_reader(input, tx).unwrap();

        assert_eq!(
            listener.listen(WINDOW, WINDOW).await,
            Ok("alexa play jazz".to_string())
        );
        assert_eq!(
            listener.listen(WINDOW, WINDOW).await,
            Err(CaptureFailure::Unintelligible)
        );
        assert_eq!(
            listener.listen(WINDOW, WINDOW).await,
            Ok("who is ada lovelace".to_string())
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_keyboard_read_error_is_service_error() {
        let (tx, _rx) = mpsc::channel(1);
        let reader = io::BufReader::new(Cursor::new(b"what time is it\n".to_vec()).chain(Detached));
        let mut listener = KeyboardListener::from_reader(reader, tx).unwrap();

        assert_eq!(
            listener.listen(WINDOW, WINDOW).await,
            Ok("what time is it".to_string())
        );
        assert!(matches!(
            listener.listen(WINDOW, WINDOW).await,
            Err(CaptureFailure::ServiceError(msg)) if msg.contains("terminal detached")
        ));
    }

    #[tokio::test]
    async fn test_keyboard_eof_requests_shutdown() {
        let (tx, mut rx) = mpsc::channel(1);
        let mut listener = KeyboardListener::from_reader(Cursor::new(Vec::new()), tx).unwrap();

        assert_eq!(
            listener.listen(WINDOW, WINDOW).await,
            Err(CaptureFailure::Timeout)
        );
        assert_eq!(rx.try_recv(), Ok(()));

        // Stays closed without signalling again
        assert_eq!(
            listener.listen(WINDOW, WINDOW).await,
            Err(CaptureFailure::Timeout)
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_keyboard_silence_times_out() {
        let (shutdown, mut rx) = mpsc::channel(1);
        let (_lines_tx, lines) = mpsc::channel(1);
        let mut listener = KeyboardListener::new(lines, shutdown);

        assert_eq!(
            listener.listen(Duration::from_millis(20), WINDOW).await,
            Err(CaptureFailure::Timeout)
        );
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_keyboard_waits_for_next_line() {
        let (shutdown, _rx) = mpsc::channel(1);
        let (lines_tx, lines) = mpsc::channel(1);
        let mut listener = KeyboardListener::new(lines, shutdown);

        let mut heard = tokio_test::task::spawn(listener.listen(WINDOW, WINDOW));
        tokio_test::assert_pending!(heard.poll());

        lines_tx.send(Ok("Tell Me A Joke".into())).await.unwrap();
        assert!(heard.is_woken());
        tokio_test::assert_ready_eq!(heard.poll(), Ok("tell me a joke".to_string()));
    }

    #[test]
    fn test_pending_read_does_not_block_runtime_shutdown() {
        // A pipe whose writer stays open blocks the reader like an idle terminal
        let (reader, writer) = io::pipe().unwrap();
        let (shutdown, _rx) = mpsc::channel(1);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        let started = Instant::now();

        let heard = runtime.block_on(async {
            let mut listener =
                KeyboardListener::from_reader(io::BufReader::new(reader), shutdown).unwrap();
            listener.listen(Duration::from_millis(50), WINDOW).await
        });
        drop(runtime);

        assert_eq!(heard, Err(CaptureFailure::Timeout));
        assert!(started.elapsed() < Duration::from_secs(2));
        drop(writer);
    }
}
