//! Dispatcher integration tests
//!
//! Every intent is run against in-memory collaborators; nothing here touches
//! audio hardware or the network.

use hark::services::LookupError;
use hark::{DispatchFailure, DispatchResult, Intent};

mod common;

use common::Fakes;

fn spoken(text: &str) -> DispatchResult {
    DispatchResult::Spoken(text.to_string())
}

#[tokio::test]
async fn test_play_without_query_asks_for_one() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    let result = dispatcher.dispatch(&Intent::PlayMedia(String::new())).await;

    assert_eq!(result, spoken("Please tell me the song name to play."));
    assert_eq!(observed.spoken.entries(), ["Please tell me the song name to play."]);
    assert!(observed.played.entries().is_empty());
}

#[tokio::test]
async fn test_play_confirms_then_launches() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    let result = dispatcher.dispatch(&Intent::PlayMedia("shape of you".into())).await;

    assert_eq!(result, spoken("Playing shape of you on YouTube"));
    assert_eq!(observed.spoken.entries(), ["Playing shape of you on YouTube"]);
    assert_eq!(observed.played.entries(), ["shape of you"]);
}

#[tokio::test]
async fn test_play_launch_failure_apologises() {
    let (dispatcher, observed) = Fakes {
        media_fails: true,
        ..Fakes::default()
    }
    .dispatcher();

    let result = dispatcher.dispatch(&Intent::PlayMedia("jazz".into())).await;

    assert!(matches!(result, DispatchResult::Failed(DispatchFailure::Unexpected(_))));
    assert_eq!(
        observed.spoken.entries(),
        [
            "Playing jazz on YouTube",
            "I ran into an error while handling that command."
        ]
    );
}

#[tokio::test]
async fn test_tell_time_uses_twelve_hour_clock() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    let result = dispatcher.dispatch(&Intent::TellTime).await;

    assert_eq!(result, spoken("Current time is 02:05 PM"));
    assert_eq!(observed.spoken.entries(), ["Current time is 02:05 PM"]);
}

#[tokio::test]
async fn test_who_is_without_subject_asks_for_one() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    let result = dispatcher.dispatch(&Intent::WhoIs(String::new())).await;

    assert_eq!(result, spoken("Who do you want me to search for?"));
    assert!(observed.lookups.entries().is_empty());
}

#[tokio::test]
async fn test_who_is_speaks_one_sentence_summary() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    let result = dispatcher.dispatch(&Intent::WhoIs("ada lovelace".into())).await;

    assert_eq!(result, spoken("Ada Lovelace was an English mathematician."));
    assert_eq!(observed.lookups.entries(), ["ada lovelace:1"]);
    assert_eq!(
        observed.spoken.entries(),
        ["Ada Lovelace was an English mathematician."]
    );
}

#[tokio::test]
async fn test_ambiguous_lists_first_five() {
    let candidates = ["a", "b", "c", "d", "e", "f"].map(String::from).to_vec();
    let (dispatcher, observed) = Fakes {
        lookup: Err(LookupError::Ambiguous(candidates)),
        ..Fakes::default()
    }
    .dispatcher();

    let result = dispatcher.dispatch(&Intent::WhoIs("mercury".into())).await;

    assert_eq!(
        result,
        DispatchResult::Failed(DispatchFailure::Ambiguous(
            ["a", "b", "c", "d", "e"].map(String::from).to_vec()
        ))
    );

    let said = observed.spoken.entries();
    assert_eq!(said, ["That name is ambiguous. For example: a, b, c, d, e"]);
    assert!(!said[0].ends_with(", f"));
}

#[tokio::test]
async fn test_not_found_is_reported() {
    let (dispatcher, observed) = Fakes {
        lookup: Err(LookupError::NotFound),
        ..Fakes::default()
    }
    .dispatcher();

    let result = dispatcher.dispatch(&Intent::WhoIs("nobody at all".into())).await;

    assert_eq!(result, DispatchResult::Failed(DispatchFailure::NotFound));
    assert_eq!(
        observed.spoken.entries(),
        ["I couldn't find that person on Wikipedia."]
    );
}

#[tokio::test]
async fn test_lookup_outage_gets_generic_apology() {
    let (dispatcher, observed) = Fakes {
        lookup: Err(LookupError::Unavailable("connection reset".into())),
        ..Fakes::default()
    }
    .dispatcher();

    let result = dispatcher.dispatch(&Intent::WhoIs("grace hopper".into())).await;

    assert_eq!(
        result,
        DispatchResult::Failed(DispatchFailure::Unavailable("connection reset".into()))
    );
    assert_eq!(
        observed.spoken.entries(),
        ["Sorry, I couldn't get information from Wikipedia right now."]
    );
}

#[tokio::test]
async fn test_canned_replies() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    dispatcher.dispatch(&Intent::DeclineDate).await;
    dispatcher.dispatch(&Intent::RelationshipJoke).await;
    dispatcher.dispatch(&Intent::Unrecognized).await;

    assert_eq!(
        observed.spoken.entries(),
        [
            "Sorry, I have a headache.",
            "I am in a relationship with Wi-Fi.",
            "Please say the command again."
        ]
    );
    assert!(observed.played.entries().is_empty());
    assert!(observed.lookups.entries().is_empty());
}

#[tokio::test]
async fn test_joke_is_repeatable() {
    let (dispatcher, observed) = Fakes::default().dispatcher();

    let first = dispatcher.dispatch(&Intent::TellJoke).await;
    let second = dispatcher.dispatch(&Intent::TellJoke).await;

    assert_eq!(first, second);
    assert_eq!(
        first,
        spoken("I would tell you a UDP joke, but you might not get it.")
    );
    assert_eq!(observed.spoken.entries().len(), 2);
}

#[tokio::test]
async fn test_joke_failure_is_contained() {
    let (dispatcher, observed) = Fakes {
        jokes: Vec::new(),
        ..Fakes::default()
    }
    .dispatcher();

    let result = dispatcher.dispatch(&Intent::TellJoke).await;

    assert!(matches!(result, DispatchResult::Failed(DispatchFailure::Unexpected(_))));
    assert_eq!(
        observed.spoken.entries(),
        ["I ran into an error while handling that command."]
    );
}

#[tokio::test]
async fn test_speaker_failure_is_contained() {
    let (dispatcher, _observed) = Fakes {
        broken_speaker: true,
        ..Fakes::default()
    }
    .dispatcher();

    let result = dispatcher.dispatch(&Intent::TellTime).await;

    assert!(matches!(result, DispatchResult::Failed(DispatchFailure::Unexpected(_))));
}
