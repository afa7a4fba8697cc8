//! Session loop
//!
//! Listens, resolves, and dispatches one command at a time until an
//! interrupt arrives. The interrupt is only checked between iterations; a
//! capture or dispatch in progress always runs to completion.

use tokio::sync::mpsc;

use crate::config::ListenConfig;
use crate::dispatch::{DispatchResult, Dispatcher};
use crate::intent::{Intent, IntentResolver};
use crate::voice::{CaptureFailure, Listener};

/// Spoken once the loop has stopped
pub const FAREWELL: &str = "Goodbye.";

/// Session lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Listening,
    Terminated,
}

/// What happened in one iteration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// No transcript; nothing was resolved or spoken
    Skipped(CaptureFailure),
    /// A transcript was resolved and dispatched
    Handled {
        intent: Intent,
        result: DispatchResult,
    },
}

/// A listening session
pub struct Session<L> {
    listener: L,
    resolver: IntentResolver,
    dispatcher: Dispatcher,
    listen: ListenConfig,
    state: SessionState,
}

impl<L: Listener> Session<L> {
    #[must_use]
    pub const fn new(
        listener: L,
        resolver: IntentResolver,
        dispatcher: Dispatcher,
        listen: ListenConfig,
    ) -> Self {
        Self {
            listener,
            resolver,
            dispatcher,
            listen,
            state: SessionState::Listening,
        }
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Greeting spoken when the session starts
    #[must_use]
    pub fn greeting(&self) -> String {
        format!(
            "Hey! I am ready. Say '{}' followed by a command.",
            capitalize(self.resolver.wake_word())
        )
    }

    /// Run a single capture, resolve, dispatch iteration
    pub async fn step(&mut self) -> Step {
        let transcript = match self
            .listener
            .listen(self.listen.timeout, self.listen.phrase_time_limit)
            .await
        {
            Ok(transcript) => transcript,
            Err(failure) => {
                match &failure {
                    CaptureFailure::Timeout => tracing::debug!("no speech detected"),
                    CaptureFailure::Unintelligible => tracing::info!("could not understand audio"),
                    CaptureFailure::ServiceError(detail) => {
                        tracing::warn!(error = %detail, "speech capture failed");
                    }
                }
                return Step::Skipped(failure);
            }
        };

        let intent = self.resolver.resolve(&transcript);
        tracing::info!(transcript = %transcript, intent = %intent, "command");

        let result = self.dispatcher.dispatch(&intent).await;
        Step::Handled { intent, result }
    }

    /// Greet, then loop until `shutdown` receives a signal, then say goodbye
    ///
    /// A closed shutdown channel is not an interrupt; the loop keeps going.
    pub async fn run(&mut self, shutdown: &mut mpsc::Receiver<()>) {
        if let Err(e) = self.dispatcher.announce(&self.greeting()).await {
            tracing::warn!(error = %e, "failed to speak greeting");
        }

        while self.state == SessionState::Listening {
            if shutdown.try_recv().is_ok() {
                tracing::info!("interrupt received, stopping");
                self.state = SessionState::Terminated;
                break;
            }

            self.step().await;
        }

        if let Err(e) = self.dispatcher.announce(FAREWELL).await {
            tracing::warn!(error = %e, "failed to speak farewell");
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("alexa"), "Alexa");
        assert_eq!(capitalize("ok computer"), "Ok computer");
        assert_eq!(capitalize(""), "");
    }
}
