//! Trivia Game - the round controller and its collaborator seams
//!
//! This crate turns one "play" trigger into a full trivia session:
//! - **Source** (`source`) - fetches a random question over HTTP
//! - **Dialogue** (`dialogue`) - the turn-taking seam to the messaging
//!   transport; the controller asks and says, the driver moves the bytes
//! - **Controller** (`controller`) - the explicit round state machine:
//!   `Fetching -> Presenting -> AwaitingGuess -> terminal`, chaining new
//!   rounds as loop transitions rather than recursion
//!
//! The controller never touches Slack types. The Slack crate implements
//! `DialogueDriver` and renders `SessionMessage`/`SessionPrompt` into
//! Block Kit messages.

pub mod controller;
pub mod dialogue;
pub mod source;

pub use controller::{RoundController, SessionEnd, SessionError, SessionOutcome};
pub use dialogue::{DialogueDriver, DialogueError, SessionMessage, SessionPrompt};
pub use source::{HttpTriviaSource, TriviaSource, TriviaSourceError};
