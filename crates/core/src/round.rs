use crate::answer::AcceptedAnswers;

/// Attempts granted per question.
pub const INITIAL_ATTEMPTS: u8 = 3;

/// One fetched trivia question. Immutable for the duration of its round and
/// discarded with it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriviaQuestion {
    pub category: String,
    pub prompt: String,
    pub raw_answer: String,
}

/// Result of evaluating a single user reply against the round.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuessOutcome {
    /// The reply matched an accepted answer.
    Correct,
    /// The user asked for the next question.
    NextRequested,
    /// The user asked to stop playing.
    Stopped,
    /// Wrong guess with attempts still remaining.
    Incorrect { attempts_remaining: u8 },
    /// Wrong guess that consumed the last attempt.
    Exhausted,
}

/// Mutable state of one question/answer cycle: the question, its accepted
/// answer forms, and the attempt countdown. Created when a round starts and
/// destroyed when it ends; only `evaluate` mutates it.
#[derive(Clone, Debug)]
pub struct RoundState {
    question: TriviaQuestion,
    accepted: AcceptedAnswers,
    attempts_remaining: u8,
}

impl RoundState {
    pub fn new(question: TriviaQuestion) -> Self {
        Self::with_attempts(question, INITIAL_ATTEMPTS)
    }

    pub fn with_attempts(question: TriviaQuestion, attempts: u8) -> Self {
        let accepted = AcceptedAnswers::normalize(&question.raw_answer);
        Self { question, accepted, attempts_remaining: attempts.max(1) }
    }

    pub fn question(&self) -> &TriviaQuestion {
        &self.question
    }

    pub fn accepted(&self) -> &AcceptedAnswers {
        &self.accepted
    }

    pub fn attempts_remaining(&self) -> u8 {
        self.attempts_remaining
    }

    /// Matches `reply` in priority order: primary answer, secondary answer,
    /// literal `next`, literal `stop`, default. The default branch burns an
    /// attempt; the floor is zero.
    pub fn evaluate(&mut self, reply: &str) -> GuessOutcome {
        if self.accepted.iter().any(|pattern| pattern_matches(pattern, reply)) {
            return GuessOutcome::Correct;
        }
        if pattern_matches("next", reply) {
            return GuessOutcome::NextRequested;
        }
        if pattern_matches("stop", reply) {
            return GuessOutcome::Stopped;
        }

        self.attempts_remaining = self.attempts_remaining.saturating_sub(1);
        if self.attempts_remaining == 0 {
            GuessOutcome::Exhausted
        } else {
            GuessOutcome::Incorrect { attempts_remaining: self.attempts_remaining }
        }
    }
}

/// Case-insensitive containment test, matching how the previous bot's
/// framework ran each answer pattern against the reply. Empty patterns
/// never match.
pub fn pattern_matches(pattern: &str, reply: &str) -> bool {
    !pattern.is_empty() && reply.to_lowercase().contains(&pattern.to_lowercase())
}

// Affirmation vocabulary owned here instead of borrowed from a framework
// ambient, so the accepted phrases are visible and testable. Matching is an
// anchored prefix check, as the original vocabulary regexes were.
const YES_VOCABULARY: &[&str] = &["yes", "yea", "yup", "yep", "yeah", "yah", "ya", "sure", "ok", "y"];
const NO_VOCABULARY: &[&str] = &["no", "nah", "nope", "n"];

pub fn is_yes(reply: &str) -> bool {
    prefix_match(reply, YES_VOCABULARY)
}

pub fn is_no(reply: &str) -> bool {
    prefix_match(reply, NO_VOCABULARY)
}

fn prefix_match(reply: &str, vocabulary: &[&str]) -> bool {
    let normalized = reply.trim().to_lowercase();
    vocabulary.iter().any(|word| normalized.starts_with(word))
}
