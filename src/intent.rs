//! Intent resolution
//!
//! Turns a lowercase transcript into exactly one [`Intent`]. Checks run in a
//! fixed order and the first match wins, so `"what time should i play"` is
//! [`Intent::TellTime`] while `"play what time is it"` is [`Intent::PlayMedia`].

use std::borrow::Cow;
use std::fmt;

/// Default wake token
pub const DEFAULT_WAKE_WORD: &str = "alexa";

/// Media prefix, matched at the start of the command only
const PLAY_PREFIX: &str = "play";

/// Encyclopedia phrasings, matched at the start of the command
const WHO_IS_PHRASES: [&str; 3] = ["who is", "who the heck is", "who's"];

/// A resolved user request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Play media; an empty query asks the user for a title
    PlayMedia(String),
    /// Speak the local wall-clock time
    TellTime,
    /// Look up a one-sentence summary; an empty subject asks who to search for
    WhoIs(String),
    /// Canned refusal
    DeclineDate,
    /// Canned reply
    RelationshipJoke,
    /// Joke from the joke source
    TellJoke,
    /// Fallback when nothing matched
    Unrecognized,
}

impl Intent {
    /// Short stable name, used in logs
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::PlayMedia(_) => "play_media",
            Self::TellTime => "tell_time",
            Self::WhoIs(_) => "who_is",
            Self::DeclineDate => "decline_date",
            Self::RelationshipJoke => "relationship_joke",
            Self::TellJoke => "tell_joke",
            Self::Unrecognized => "unrecognized",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlayMedia(query) => write!(f, "{}({query:?})", self.name()),
            Self::WhoIs(subject) => write!(f, "{}({subject:?})", self.name()),
            _ => f.write_str(self.name()),
        }
    }
}

/// Maps transcripts to intents
#[derive(Debug, Clone)]
pub struct IntentResolver {
    wake_word: String,
}

impl Default for IntentResolver {
    fn default() -> Self {
        Self::new(DEFAULT_WAKE_WORD)
    }
}

impl IntentResolver {
    /// Create a resolver that strips the given wake token
    ///
    /// The token is normalized to lowercase and trimmed. An empty token
    /// disables wake-word stripping.
    #[must_use]
    pub fn new(wake_word: &str) -> Self {
        Self {
            wake_word: wake_word.trim().to_lowercase(),
        }
    }

    /// Get the configured wake token
    #[must_use]
    pub fn wake_word(&self) -> &str {
        &self.wake_word
    }

    /// Resolve a transcript to an intent
    ///
    /// Total: every input, including the empty string, yields a value.
    #[must_use]
    pub fn resolve(&self, transcript: &str) -> Intent {
        let lowered = transcript.to_lowercase();
        let stripped = self.strip_wake_word(&lowered);
        let command = stripped.as_ref();

        if has_leading_token(command, PLAY_PREFIX) {
            let query = command.replacen(PLAY_PREFIX, "", 1);
            return Intent::PlayMedia(query.trim().to_string());
        }

        if command.contains("time") {
            return Intent::TellTime;
        }

        if WHO_IS_PHRASES
            .iter()
            .any(|phrase| has_leading_token(command, phrase))
        {
            let subject = WHO_IS_PHRASES
                .iter()
                .fold(command.to_string(), |acc, phrase| acc.replace(phrase, ""));
            return Intent::WhoIs(subject.trim().to_string());
        }

        if command.contains("date") {
            return Intent::DeclineDate;
        }

        if command.contains("are you single") {
            return Intent::RelationshipJoke;
        }

        if command.contains("joke") {
            return Intent::TellJoke;
        }

        Intent::Unrecognized
    }

    /// Remove the first occurrence of the wake token, if present
    ///
    /// Borrowed passthrough when the token is absent.
    fn strip_wake_word<'a>(&self, transcript: &'a str) -> Cow<'a, str> {
        if self.wake_word.is_empty() || !transcript.contains(&self.wake_word) {
            return Cow::Borrowed(transcript.trim());
        }

        let command = transcript.replacen(&self.wake_word, "", 1).trim().to_string();
        tracing::debug!(command = %command, "command after wake word");
        Cow::Owned(command)
    }
}

/// True when `text` is `token` or starts with `token` followed by whitespace
fn has_leading_token(text: &str, token: &str) -> bool {
    text.strip_prefix(token)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str) -> Intent {
        IntentResolver::default().resolve(text)
    }

    #[test]
    fn test_play_with_wake_word() {
        assert_eq!(
            resolve("alexa play shape of you"),
            Intent::PlayMedia("shape of you".to_string())
        );
    }

    #[test]
    fn test_play_without_argument() {
        assert_eq!(resolve("play"), Intent::PlayMedia(String::new()));
        assert_eq!(resolve("alexa play  "), Intent::PlayMedia(String::new()));
    }

    #[test]
    fn test_play_strips_first_occurrence_only() {
        assert_eq!(
            resolve("play play that funky music"),
            Intent::PlayMedia("play that funky music".to_string())
        );
    }

    #[test]
    fn test_play_requires_word_boundary() {
        // "playground" is not the play prefix, and contains no other trigger
        assert_eq!(resolve("playground rules"), Intent::Unrecognized);
    }

    #[test]
    fn test_time_checked_before_who_is() {
        assert_eq!(resolve("alexa what time is it"), Intent::TellTime);
        assert_eq!(resolve("who is on at showtime"), Intent::TellTime);
    }

    #[test]
    fn test_play_prefix_beats_time_substring() {
        assert_eq!(
            resolve("play time after time"),
            Intent::PlayMedia("time after time".to_string())
        );
        assert_eq!(resolve("what time should i play"), Intent::TellTime);
    }

    #[test]
    fn test_who_is_variants() {
        assert_eq!(
            resolve("who is ada lovelace"),
            Intent::WhoIs("ada lovelace".to_string())
        );
        assert_eq!(
            resolve("alexa who the heck is grace hopper"),
            Intent::WhoIs("grace hopper".to_string())
        );
        assert_eq!(
            resolve("who's alan turing"),
            Intent::WhoIs("alan turing".to_string())
        );
    }

    #[test]
    fn test_who_is_strips_every_occurrence() {
        assert_eq!(
            resolve("who is who is linus"),
            Intent::WhoIs("linus".to_string())
        );
        assert_eq!(
            resolve("who's who's the doctor"),
            Intent::WhoIs("the doctor".to_string())
        );
    }

    #[test]
    fn test_who_is_without_subject() {
        assert_eq!(resolve("who is"), Intent::WhoIs(String::new()));
    }

    #[test]
    fn test_wake_word_stripped_once() {
        assert_eq!(
            resolve("alexa play alexa by the band"),
            Intent::PlayMedia("alexa by the band".to_string())
        );
    }

    #[test]
    fn test_wake_word_only() {
        assert_eq!(resolve("alexa"), Intent::Unrecognized);
        assert_eq!(resolve(""), Intent::Unrecognized);
    }

    #[test]
    fn test_canned_intents() {
        assert_eq!(resolve("alexa will you go on a date with me"), Intent::DeclineDate);
        assert_eq!(resolve("alexa are you single"), Intent::RelationshipJoke);
        assert_eq!(resolve("alexa tell me a joke"), Intent::TellJoke);
        assert_eq!(resolve("know any good jokes"), Intent::TellJoke);
    }

    #[test]
    fn test_date_checked_before_joke() {
        assert_eq!(resolve("tell me a joke about dates"), Intent::DeclineDate);
    }

    #[test]
    fn test_unrecognized_fallback() {
        assert_eq!(resolve("turn on the lights"), Intent::Unrecognized);
    }

    #[test]
    fn test_uppercase_input_is_normalized() {
        assert_eq!(resolve("Alexa What TIME is it"), Intent::TellTime);
    }

    #[test]
    fn test_custom_wake_word() {
        let resolver = IntentResolver::new("  Computer ");
        assert_eq!(resolver.wake_word(), "computer");
        assert_eq!(
            resolver.resolve("computer play jazz"),
            Intent::PlayMedia("jazz".to_string())
        );
        // "alexa" is no longer stripped, so the play prefix is not leading
        assert_eq!(resolver.resolve("alexa play jazz"), Intent::Unrecognized);
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Intent::PlayMedia("jazz".to_string()).to_string(),
            "play_media(\"jazz\")"
        );
        assert_eq!(Intent::TellTime.to_string(), "tell_time");
    }
}
