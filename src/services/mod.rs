//! Lookup collaborators used by the dispatcher
//!
//! Each capability is a trait so the dispatcher can be driven by in-memory
//! fakes in tests. Production implementations live in the submodules.

mod clock;
mod encyclopedia;
mod jokes;
mod media;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use thiserror::Error;

pub use clock::{SystemClock, spoken_time};
pub use encyclopedia::WikipediaClient;
pub use jokes::BuiltinJokes;
pub use media::{YouTubePlayer, first_video_id};

/// Failure modes of an encyclopedia lookup
///
/// Every variant is reported to the user; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The term maps to several pages; candidates are in the order the
    /// disambiguation page lists them
    #[error("ambiguous term ({} candidates)", .0.len())]
    Ambiguous(Vec<String>),

    /// No page matched the term
    #[error("no page found")]
    NotFound,

    /// Transport or service failure
    #[error("lookup unavailable: {0}")]
    Unavailable(String),
}

/// Encyclopedia summaries
#[async_trait]
pub trait Encyclopedia: Send + Sync {
    /// Fetch a summary of `subject` limited to `sentences` sentences
    ///
    /// # Errors
    ///
    /// Returns a [`LookupError`] describing why no summary is available
    async fn summary(&self, subject: &str, sentences: usize) -> Result<String, LookupError>;
}

/// Media playback launcher
///
/// Launching is fire-and-forget: `Ok` means the launch was handed off, not
/// that anything is audible.
#[async_trait]
pub trait MediaPlayer: Send + Sync {
    /// Find and start playing media matching `query`
    ///
    /// # Errors
    ///
    /// Returns error if the lookup or launch fails
    async fn play(&self, query: &str) -> crate::Result<()>;
}

/// Source of one-liner jokes
pub trait JokeSource: Send + Sync {
    /// Produce a joke
    ///
    /// # Errors
    ///
    /// Returns error if no joke is available
    fn joke(&self) -> crate::Result<String>;
}

/// Local wall-clock time
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;
}
