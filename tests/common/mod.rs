//! Shared test utilities
//!
//! In-memory collaborators that record what the dispatcher asked of them.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use tokio::sync::mpsc;

use hark::config::ListenConfig;
use hark::services::{BuiltinJokes, Clock, Encyclopedia, LookupError, MediaPlayer};
use hark::voice::{CaptureFailure, Listener, Speaker};
use hark::{Collaborators, Dispatcher, Error, IntentResolver, Session};

/// Append-only record shared between a fake and the test
#[derive(Clone, Default)]
pub struct Log(Arc<Mutex<Vec<String>>>);

impl Log {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Records every utterance
pub struct RecordingSpeaker(pub Log);

#[async_trait(?Send)]
impl Speaker for RecordingSpeaker {
    async fn say(&self, text: &str) -> hark::Result<()> {
        self.0.push(text);
        Ok(())
    }
}

/// Fails every utterance
pub struct BrokenSpeaker;

#[async_trait(?Send)]
impl Speaker for BrokenSpeaker {
    async fn say(&self, _text: &str) -> hark::Result<()> {
        Err(Error::Audio("no output device available".to_string()))
    }
}

/// Records queries; optionally fails to launch
pub struct RecordingMedia {
    pub played: Log,
    pub fail: bool,
}

#[async_trait]
impl MediaPlayer for RecordingMedia {
    async fn play(&self, query: &str) -> hark::Result<()> {
        self.played.push(query);
        if self.fail {
            return Err(Error::Media("browser failed to launch".to_string()));
        }
        Ok(())
    }
}

/// Answers every lookup with the same response
pub struct CannedEncyclopedia {
    pub lookups: Log,
    pub response: Result<String, LookupError>,
}

#[async_trait]
impl Encyclopedia for CannedEncyclopedia {
    async fn summary(&self, subject: &str, sentences: usize) -> Result<String, LookupError> {
        self.lookups.push(format!("{subject}:{sentences}"));
        self.response.clone()
    }
}

/// Always reports the same instant
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// 2:05 PM on an arbitrary day
#[must_use]
pub fn afternoon() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .and_then(|d| d.and_hms_opt(14, 5, 0))
        .unwrap()
}

/// What the fakes observed
#[derive(Clone, Default)]
pub struct Observed {
    pub spoken: Log,
    pub played: Log,
    pub lookups: Log,
}

/// Knobs for building fakes
pub struct Fakes {
    pub lookup: Result<String, LookupError>,
    pub jokes: Vec<String>,
    pub media_fails: bool,
    pub broken_speaker: bool,
}

impl Default for Fakes {
    fn default() -> Self {
        Self {
            lookup: Ok("Ada Lovelace was an English mathematician.".to_string()),
            jokes: vec!["I would tell you a UDP joke, but you might not get it.".to_string()],
            media_fails: false,
            broken_speaker: false,
        }
    }
}

impl Fakes {
    /// Build collaborators wired to a fresh set of logs
    #[must_use]
    pub fn build(self) -> (Collaborators, Observed) {
        let observed = Observed::default();

        let speaker: Box<dyn Speaker> = if self.broken_speaker {
            Box::new(BrokenSpeaker)
        } else {
            Box::new(RecordingSpeaker(observed.spoken.clone()))
        };

        let collaborators = Collaborators {
            speaker,
            media: Box::new(RecordingMedia {
                played: observed.played.clone(),
                fail: self.media_fails,
            }),
            encyclopedia: Box::new(CannedEncyclopedia {
                lookups: observed.lookups.clone(),
                response: self.lookup,
            }),
            jokes: Box::new(BuiltinJokes::with_jokes(self.jokes)),
            clock: Box::new(FixedClock(afternoon())),
        };

        (collaborators, observed)
    }

    /// Build a dispatcher asking for one-sentence summaries
    #[must_use]
    pub fn dispatcher(self) -> (Dispatcher, Observed) {
        let (collaborators, observed) = self.build();
        (Dispatcher::new(collaborators, 1), observed)
    }
}

/// Plays back a fixed sequence of capture results, then requests shutdown
pub struct ScriptedListener {
    script: VecDeque<Result<String, CaptureFailure>>,
    shutdown: mpsc::Sender<()>,
}

impl ScriptedListener {
    #[must_use]
    pub fn new(
        script: Vec<Result<String, CaptureFailure>>,
        shutdown: mpsc::Sender<()>,
    ) -> Self {
        Self {
            script: script.into(),
            shutdown,
        }
    }
}

#[async_trait(?Send)]
impl Listener for ScriptedListener {
    async fn listen(
        &mut self,
        _timeout: Duration,
        _phrase_limit: Duration,
    ) -> Result<String, CaptureFailure> {
        self.script.pop_front().unwrap_or_else(|| {
            let _ = self.shutdown.try_send(());
            Err(CaptureFailure::Timeout)
        })
    }
}

/// Session over a script with default fakes
#[must_use]
pub fn scripted_session(
    script: Vec<Result<String, CaptureFailure>>,
    fakes: Fakes,
) -> (Session<ScriptedListener>, mpsc::Receiver<()>, Observed) {
    let (tx, rx) = mpsc::channel(1);
    let (dispatcher, observed) = fakes.dispatcher();
    let session = Session::new(
        ScriptedListener::new(script, tx),
        IntentResolver::default(),
        dispatcher,
        ListenConfig::default(),
    );
    (session, rx, observed)
}

/// Shorthand for a successful capture
#[must_use]
pub fn heard(text: &str) -> Result<String, CaptureFailure> {
    Ok(text.to_string())
}
