use async_trait::async_trait;
use thiserror::Error;

/// Statements the round controller emits without expecting a reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionMessage {
    /// The reply matched an accepted answer.
    Correct,
    /// Wrong guess, attempts still remaining.
    TryAgain { attempts_remaining: u8 },
    /// The user asked to stop playing.
    Farewell,
    /// Lead-in before the lookup link.
    LookupIntro,
    /// Search link for the revealed answer.
    LookupLink { url: String },
    /// The user declined the lookup follow-up.
    FollowUpFarewell,
}

/// Prompts that expect a reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionPrompt {
    /// The question card: category plus prompt text.
    Question { category: String, prompt: String },
    /// Attempts exhausted: reveal the answer and offer the lookup branch.
    Reveal { raw_answer: String },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DialogueError {
    #[error("conversation closed: {0}")]
    Closed(String),
    #[error("message delivery failed: {0}")]
    Delivery(String),
}

/// Turn-taking seam to the messaging transport. The driver owns message
/// delivery and reply sequencing for exactly one conversation scope; the
/// controller owns pattern matching and round state.
#[async_trait]
pub trait DialogueDriver: Send + Sync {
    async fn say(&self, message: SessionMessage) -> Result<(), DialogueError>;
    async fn ask(&self, prompt: SessionPrompt) -> Result<String, DialogueError>;
}
