//! Trivia Core - domain logic for the trivet bot
//!
//! This crate holds everything that does not need a network or a Slack
//! connection:
//! - **Answer normalization** (`answer`) - turns a raw trivia answer like
//!   `"(The) Eiffel Tower"` or `"<i>Macbeth</i>"` into the accepted forms
//! - **Round state machine** (`round`) - attempt countdown and guess
//!   evaluation for one question/answer cycle
//! - **Lookup links** (`lookup`) - "let me google that" follow-up links
//! - **Configuration** (`config`) - layered TOML + env config with
//!   secret-wrapped Slack tokens
//!
//! # Key Types
//!
//! - `AcceptedAnswers` - the 1-2 normalized strings a reply must match
//! - `RoundState` - attempts remaining plus the question being played
//! - `GuessOutcome` - result of evaluating a single user reply

pub mod answer;
pub mod config;
pub mod lookup;
pub mod round;

pub use answer::AcceptedAnswers;
pub use round::{GuessOutcome, RoundState, TriviaQuestion, INITIAL_ATTEMPTS};
