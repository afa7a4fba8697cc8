//! Hark - hands-free voice commands
//!
//! This library provides the pieces of a sequential voice-command loop:
//! - Voice processing (capture, endpointing, STT, TTS)
//! - Intent resolution from lowercase transcripts
//! - Action dispatch against lookup services (media, encyclopedia, jokes, clock)
//! - The session loop tying them together
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Session                           │
//! │        Listener  →  Resolver  →  Dispatcher          │
//! └──────────┬───────────────────────────┬──────────────┘
//!            │                           │
//! ┌──────────▼──────────┐   ┌────────────▼──────────────┐
//! │        Voice        │   │         Services           │
//! │  Mic │ STT │ TTS    │   │ YouTube │ Wikipedia │ ...  │
//! └─────────────────────┘   └────────────────────────────┘
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod intent;
pub mod services;
pub mod session;
pub mod setup;
pub mod voice;

pub use config::Config;
pub use dispatch::{Collaborators, DispatchFailure, DispatchResult, Dispatcher};
pub use error::{Error, Result};
pub use intent::{Intent, IntentResolver};
pub use session::{Session, SessionState, Step};
