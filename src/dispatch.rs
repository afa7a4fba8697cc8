//! Action dispatch
//!
//! Executes a resolved [`Intent`] against the collaborators and speaks the
//! outcome. Lookup failures become user-facing messages; anything else that
//! goes wrong is caught here, apologised for, and reported as
//! [`DispatchFailure::Unexpected`] so the session keeps running.

use crate::intent::Intent;
use crate::services::{Clock, Encyclopedia, JokeSource, LookupError, MediaPlayer, spoken_time};
use crate::voice::Speaker;
use crate::Result;

/// Most candidates read out for an ambiguous lookup
pub const MAX_CANDIDATES: usize = 5;

const PLAY_CLARIFICATION: &str = "Please tell me the song name to play.";
const WHO_CLARIFICATION: &str = "Who do you want me to search for?";
const DECLINE_DATE: &str = "Sorry, I have a headache.";
const RELATIONSHIP_JOKE: &str = "I am in a relationship with Wi-Fi.";
const PLEASE_REPEAT: &str = "Please say the command again.";
const NOT_FOUND: &str = "I couldn't find that person on Wikipedia.";
const UNAVAILABLE: &str = "Sorry, I couldn't get information from Wikipedia right now.";
const APOLOGY: &str = "I ran into an error while handling that command.";

/// Everything the dispatcher talks to
pub struct Collaborators {
    pub speaker: Box<dyn Speaker>,
    pub media: Box<dyn MediaPlayer>,
    pub encyclopedia: Box<dyn Encyclopedia>,
    pub jokes: Box<dyn JokeSource>,
    pub clock: Box<dyn Clock>,
}

/// Why a dispatch did not produce its normal response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchFailure {
    /// Lookup matched several entries; holds at most [`MAX_CANDIDATES`]
    Ambiguous(Vec<String>),
    /// Lookup matched nothing
    NotFound,
    /// Lookup service could not be reached
    Unavailable(String),
    /// Anything else, caught at the dispatch boundary
    Unexpected(String),
}

impl DispatchFailure {
    /// Text spoken to the user for this failure
    #[must_use]
    pub fn utterance(&self) -> String {
        match self {
            Self::Ambiguous(candidates) if candidates.is_empty() => {
                "That name is ambiguous.".to_string()
            }
            Self::Ambiguous(candidates) => {
                format!("That name is ambiguous. For example: {}", candidates.join(", "))
            }
            Self::NotFound => NOT_FOUND.to_string(),
            Self::Unavailable(_) => UNAVAILABLE.to_string(),
            Self::Unexpected(_) => APOLOGY.to_string(),
        }
    }
}

impl From<LookupError> for DispatchFailure {
    fn from(err: LookupError) -> Self {
        match err {
            LookupError::Ambiguous(mut candidates) => {
                candidates.truncate(MAX_CANDIDATES);
                Self::Ambiguous(candidates)
            }
            LookupError::NotFound => Self::NotFound,
            LookupError::Unavailable(detail) => Self::Unavailable(detail),
        }
    }
}

/// Outcome of one dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchResult {
    /// The response that was spoken
    Spoken(String),
    /// A failure, whose message was spoken
    Failed(DispatchFailure),
}

impl DispatchResult {
    /// Text spoken to the user
    #[must_use]
    pub fn utterance(&self) -> String {
        match self {
            Self::Spoken(text) => text.clone(),
            Self::Failed(failure) => failure.utterance(),
        }
    }
}

/// Runs intents against the collaborators
pub struct Dispatcher {
    collaborators: Collaborators,
    sentences: usize,
}

impl Dispatcher {
    /// Create a dispatcher asking the encyclopedia for `sentences` sentences
    #[must_use]
    pub fn new(collaborators: Collaborators, sentences: usize) -> Self {
        Self {
            collaborators,
            sentences: sentences.max(1),
        }
    }

    /// Speak text outside of any intent (greeting, farewell)
    ///
    /// # Errors
    ///
    /// Returns error if the speaker fails
    pub async fn announce(&self, text: &str) -> Result<()> {
        self.collaborators.speaker.say(text).await
    }

    /// Execute an intent and speak the result
    ///
    /// Never fails: unexpected errors are logged, apologised for, and
    /// returned as [`DispatchFailure::Unexpected`].
    pub async fn dispatch(&self, intent: &Intent) -> DispatchResult {
        tracing::debug!(intent = %intent, "dispatching");

        match self.execute(intent).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(intent = intent.name(), error = %e, "dispatch failed");

                let failure = DispatchFailure::Unexpected(e.to_string());
                if let Err(e) = self.announce(&failure.utterance()).await {
                    tracing::error!(error = %e, "failed to speak apology");
                }
                DispatchResult::Failed(failure)
            }
        }
    }

    async fn execute(&self, intent: &Intent) -> Result<DispatchResult> {
        let c = &self.collaborators;

        let result = match intent {
            Intent::PlayMedia(query) if query.is_empty() => {
                DispatchResult::Spoken(PLAY_CLARIFICATION.to_string())
            }
            Intent::PlayMedia(query) => {
                // Confirm first; the launch itself is not verified
                let confirmation = format!("Playing {query} on YouTube");
                self.announce(&confirmation).await?;
                c.media.play(query).await?;
                return Ok(DispatchResult::Spoken(confirmation));
            }
            Intent::TellTime => {
                DispatchResult::Spoken(format!("Current time is {}", spoken_time(c.clock.now())))
            }
            Intent::WhoIs(subject) if subject.is_empty() => {
                DispatchResult::Spoken(WHO_CLARIFICATION.to_string())
            }
            Intent::WhoIs(subject) => match c.encyclopedia.summary(subject, self.sentences).await {
                Ok(summary) => DispatchResult::Spoken(summary),
                Err(e) => {
                    tracing::info!(subject = %subject, error = %e, "lookup failed");
                    DispatchResult::Failed(e.into())
                }
            },
            Intent::DeclineDate => DispatchResult::Spoken(DECLINE_DATE.to_string()),
            Intent::RelationshipJoke => DispatchResult::Spoken(RELATIONSHIP_JOKE.to_string()),
            Intent::TellJoke => DispatchResult::Spoken(c.jokes.joke()?),
            Intent::Unrecognized => DispatchResult::Spoken(PLEASE_REPEAT.to_string()),
        };

        self.announce(&result.utterance()).await?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("Candidate {i}")).collect()
    }

    #[test]
    fn test_ambiguous_truncated() {
        let failure = DispatchFailure::from(LookupError::Ambiguous(names(8)));
        assert_eq!(failure, DispatchFailure::Ambiguous(names(5)));
    }

    #[test]
    fn test_ambiguous_short_list_kept() {
        let failure = DispatchFailure::from(LookupError::Ambiguous(names(2)));
        assert_eq!(
            failure.utterance(),
            "That name is ambiguous. For example: Candidate 0, Candidate 1"
        );
    }

    #[test]
    fn test_ambiguous_without_candidates() {
        let failure = DispatchFailure::Ambiguous(Vec::new());
        assert_eq!(failure.utterance(), "That name is ambiguous.");
    }

    #[test]
    fn test_lookup_failures_map() {
        assert_eq!(DispatchFailure::from(LookupError::NotFound), DispatchFailure::NotFound);
        assert_eq!(
            DispatchFailure::from(LookupError::Unavailable("timeout".into())).utterance(),
            UNAVAILABLE
        );
    }

    #[test]
    fn test_unexpected_is_apology() {
        let result = DispatchResult::Failed(DispatchFailure::Unexpected("boom".into()));
        assert_eq!(result.utterance(), APOLOGY);
    }
}
