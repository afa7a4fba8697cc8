//! Built-in joke collection

use rand::seq::SliceRandom;

use super::JokeSource;
use crate::{Error, Result};

/// Short programming jokes, safe for any audience
const JOKES: &[&str] = &[
    "There are only 10 kinds of people in this world: those who know binary and those who don't.",
    "A programmer's partner says: go to the store and buy a loaf of bread, and if they have eggs, get a dozen. The programmer comes home with twelve loaves.",
    "Why do programmers prefer dark mode? Because light attracts bugs.",
    "I would tell you a UDP joke, but you might not get it.",
    "Debugging is like being the detective in a crime movie where you are also the murderer.",
    "Why did the developer go broke? Because they used up all their cache.",
    "There's no place like 127.0.0.1.",
    "A SQL query walks into a bar, walks up to two tables and asks: can I join you?",
    "To understand recursion, you must first understand recursion.",
    "Why do Java developers wear glasses? Because they don't C sharp.",
    "How many programmers does it take to change a light bulb? None, that's a hardware problem.",
    "The best thing about a Boolean is that even if you are wrong, you are only off by a bit.",
    "Knock knock. Race condition. Who's there?",
    "I've got a really good UDP joke to tell you, but I don't know if you'll get it.",
    "An optimist says the glass is half full. A pessimist says it's half empty. A programmer says the glass is twice as large as it needs to be.",
    "Why was the function sad after the party? It didn't get called.",
    "My code doesn't have bugs. It just develops random unexpected features.",
    "Why did the programmer quit their job? They didn't get arrays.",
];

/// Picks a random joke from a fixed collection
#[derive(Debug, Clone)]
pub struct BuiltinJokes {
    jokes: Vec<String>,
}

impl Default for BuiltinJokes {
    fn default() -> Self {
        Self {
            jokes: JOKES.iter().map(ToString::to_string).collect(),
        }
    }
}

impl BuiltinJokes {
    /// Use a custom collection instead of the built-in one
    #[must_use]
    pub const fn with_jokes(jokes: Vec<String>) -> Self {
        Self { jokes }
    }
}

impl JokeSource for BuiltinJokes {
    fn joke(&self) -> Result<String> {
        self.jokes
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| Error::Joke("joke collection is empty".to_string()))
    }
}
