use thiserror::Error;
use tracing::{debug, info};
use trivet_core::lookup::lookup_link;
use trivet_core::round::{is_no, is_yes};
use trivet_core::{GuessOutcome, RoundState, INITIAL_ATTEMPTS};

use crate::dialogue::{DialogueDriver, DialogueError, SessionMessage, SessionPrompt};
use crate::source::{TriviaSource, TriviaSourceError};

/// How a trivia session reached its end. Correct answers and `next` chain
/// into a fresh round instead of terminating, so they never appear here.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user said `stop`.
    Stopped,
    /// Attempts ran out and the reveal follow-up completed.
    Exhausted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionOutcome {
    pub end: SessionEnd,
    pub rounds_played: u32,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Source(#[from] TriviaSourceError),
    #[error(transparent)]
    Dialogue(#[from] DialogueError),
}

/// Drives trivia sessions over a `DialogueDriver`.
///
/// Each round is an explicit state machine pass: fetch a question, present
/// it, evaluate replies until a terminal outcome. A correct answer or a
/// `next` request loops straight back to fetching, replacing the old round
/// state wholesale, so arbitrarily long play sessions cost constant stack.
pub struct RoundController<S, D> {
    source: S,
    dialogue: D,
    attempts: u8,
}

impl<S, D> RoundController<S, D>
where
    S: TriviaSource,
    D: DialogueDriver,
{
    pub fn new(source: S, dialogue: D) -> Self {
        Self::with_attempts(source, dialogue, INITIAL_ATTEMPTS)
    }

    pub fn with_attempts(source: S, dialogue: D, attempts: u8) -> Self {
        Self { source, dialogue, attempts }
    }

    /// Runs rounds until the user stops or exhausts one. A source failure
    /// aborts the session before any dialogue for that round starts.
    pub async fn run(&self) -> Result<SessionOutcome, SessionError> {
        let mut rounds_played = 0u32;

        loop {
            // Fetching
            let question = self.source.fetch_random().await?;
            let mut round = RoundState::with_attempts(question, self.attempts);
            rounds_played += 1;
            info!(
                category = %round.question().category,
                rounds_played,
                "trivia round started"
            );

            // Presenting
            let prompt = SessionPrompt::Question {
                category: round.question().category.clone(),
                prompt: round.question().prompt.clone(),
            };

            // AwaitingGuess
            loop {
                let reply = self.dialogue.ask(prompt.clone()).await?;
                match round.evaluate(&reply) {
                    GuessOutcome::Correct => {
                        self.dialogue.say(SessionMessage::Correct).await?;
                        break;
                    }
                    GuessOutcome::NextRequested => break,
                    GuessOutcome::Stopped => {
                        self.dialogue.say(SessionMessage::Farewell).await?;
                        info!(rounds_played, "trivia session stopped by user");
                        return Ok(SessionOutcome { end: SessionEnd::Stopped, rounds_played });
                    }
                    GuessOutcome::Incorrect { attempts_remaining } => {
                        debug!(attempts_remaining, "wrong guess, re-prompting");
                        self.dialogue
                            .say(SessionMessage::TryAgain { attempts_remaining })
                            .await?;
                    }
                    GuessOutcome::Exhausted => {
                        self.reveal_and_offer_lookup(round.question().raw_answer.clone()).await?;
                        info!(rounds_played, "trivia session exhausted its attempts");
                        return Ok(SessionOutcome { end: SessionEnd::Exhausted, rounds_played });
                    }
                }
            }
        }
    }

    /// Exhausted branch: reveal the answer and ask the yes/no follow-up.
    /// A reply matching neither vocabulary re-asks, as the old conversation
    /// framework did for an unmatched `ask` without a default branch.
    async fn reveal_and_offer_lookup(&self, raw_answer: String) -> Result<(), SessionError> {
        loop {
            let reply = self
                .dialogue
                .ask(SessionPrompt::Reveal { raw_answer: raw_answer.clone() })
                .await?;

            if is_yes(&reply) {
                self.dialogue.say(SessionMessage::LookupIntro).await?;
                self.dialogue
                    .say(SessionMessage::LookupLink { url: lookup_link(&raw_answer) })
                    .await?;
                return Ok(());
            }
            if is_no(&reply) {
                self.dialogue.say(SessionMessage::FollowUpFarewell).await?;
                return Ok(());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use trivet_core::TriviaQuestion;

    use super::{RoundController, SessionEnd, SessionError};
    use crate::dialogue::{DialogueDriver, DialogueError, SessionMessage, SessionPrompt};
    use crate::source::{TriviaSource, TriviaSourceError};

    struct ScriptedSource {
        questions: Mutex<VecDeque<Result<TriviaQuestion, TriviaSourceError>>>,
        fetches: Mutex<u32>,
    }

    impl ScriptedSource {
        fn new(questions: Vec<Result<TriviaQuestion, TriviaSourceError>>) -> Self {
            Self { questions: Mutex::new(questions.into()), fetches: Mutex::new(0) }
        }

        fn fetches(&self) -> u32 {
            *self.fetches.lock().expect("fetch counter")
        }
    }

    #[async_trait]
    impl TriviaSource for &ScriptedSource {
        async fn fetch_random(&self) -> Result<TriviaQuestion, TriviaSourceError> {
            *self.fetches.lock().expect("fetch counter") += 1;
            self.questions
                .lock()
                .expect("question script")
                .pop_front()
                .unwrap_or_else(|| Err(TriviaSourceError::MalformedPayload("script ran dry".to_owned())))
        }
    }

    #[derive(Default)]
    struct ScriptedDialogue {
        replies: Mutex<VecDeque<String>>,
        said: Mutex<Vec<SessionMessage>>,
        asked: Mutex<Vec<SessionPrompt>>,
    }

    impl ScriptedDialogue {
        fn with_replies(replies: &[&str]) -> Self {
            Self {
                replies: Mutex::new(replies.iter().map(|reply| (*reply).to_owned()).collect()),
                ..Self::default()
            }
        }

        fn said(&self) -> Vec<SessionMessage> {
            self.said.lock().expect("said log").clone()
        }

        fn asked(&self) -> Vec<SessionPrompt> {
            self.asked.lock().expect("asked log").clone()
        }
    }

    #[async_trait]
    impl DialogueDriver for &ScriptedDialogue {
        async fn say(&self, message: SessionMessage) -> Result<(), DialogueError> {
            self.said.lock().expect("said log").push(message);
            Ok(())
        }

        async fn ask(&self, prompt: SessionPrompt) -> Result<String, DialogueError> {
            self.asked.lock().expect("asked log").push(prompt);
            self.replies
                .lock()
                .expect("reply script")
                .pop_front()
                .ok_or_else(|| DialogueError::Closed("no more scripted replies".to_owned()))
        }
    }

    fn question(raw_answer: &str) -> TriviaQuestion {
        TriviaQuestion {
            category: "Landmarks".to_owned(),
            prompt: "Gustave's iron lady".to_owned(),
            raw_answer: raw_answer.to_owned(),
        }
    }

    #[tokio::test]
    async fn correct_answer_chains_into_a_new_round() {
        let source =
            ScriptedSource::new(vec![Ok(question("(The) Eiffel Tower")), Ok(question("Paris"))]);
        let dialogue = ScriptedDialogue::with_replies(&["eiffel tower", "stop"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.end, SessionEnd::Stopped);
        assert_eq!(outcome.rounds_played, 2);
        assert_eq!(source.fetches(), 2);
        assert_eq!(dialogue.said(), vec![SessionMessage::Correct, SessionMessage::Farewell]);
    }

    #[tokio::test]
    async fn next_chains_into_a_new_round_without_feedback() {
        let source = ScriptedSource::new(vec![Ok(question("Paris")), Ok(question("Rome"))]);
        let dialogue = ScriptedDialogue::with_replies(&["next", "stop"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.rounds_played, 2);
        assert_eq!(dialogue.said(), vec![SessionMessage::Farewell]);
    }

    #[tokio::test]
    async fn stop_ends_the_session_with_a_farewell_and_no_new_round() {
        let source = ScriptedSource::new(vec![Ok(question("Paris"))]);
        let dialogue = ScriptedDialogue::with_replies(&["stop"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.end, SessionEnd::Stopped);
        assert_eq!(outcome.rounds_played, 1);
        assert_eq!(source.fetches(), 1);
        assert_eq!(dialogue.said(), vec![SessionMessage::Farewell]);
    }

    #[tokio::test]
    async fn wrong_guesses_re_prompt_the_same_question() {
        let source = ScriptedSource::new(vec![Ok(question("Paris")), Ok(question("Rome"))]);
        let dialogue = ScriptedDialogue::with_replies(&["London", "Berlin", "paris", "stop"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.end, SessionEnd::Stopped);
        let asked = dialogue.asked();
        // same question presented three times before the correct guess
        assert!(matches!(&asked[0], SessionPrompt::Question { .. }));
        assert_eq!(asked[0], asked[1]);
        assert_eq!(asked[1], asked[2]);
        assert_eq!(
            dialogue.said(),
            vec![
                SessionMessage::TryAgain { attempts_remaining: 2 },
                SessionMessage::TryAgain { attempts_remaining: 1 },
                SessionMessage::Correct,
                SessionMessage::Farewell,
            ]
        );
    }

    #[tokio::test]
    async fn exhaustion_reveals_the_answer_and_links_the_lookup_on_yes() {
        let source = ScriptedSource::new(vec![Ok(question("(The) Eiffel Tower"))]);
        let dialogue =
            ScriptedDialogue::with_replies(&["London", "Berlin", "Madrid", "yes please"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.end, SessionEnd::Exhausted);
        let asked = dialogue.asked();
        assert_eq!(
            asked.last(),
            Some(&SessionPrompt::Reveal { raw_answer: "(The) Eiffel Tower".to_owned() })
        );

        let said = dialogue.said();
        assert!(said.contains(&SessionMessage::LookupIntro));
        assert!(said.iter().any(|message| matches!(
            message,
            SessionMessage::LookupLink { url } if url.contains("Eiffel+Tower")
        )));
    }

    #[tokio::test]
    async fn declining_the_lookup_says_goodbye() {
        let source = ScriptedSource::new(vec![Ok(question("Paris"))]);
        let dialogue = ScriptedDialogue::with_replies(&["a", "b", "c", "nah"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.end, SessionEnd::Exhausted);
        assert_eq!(dialogue.said().last(), Some(&SessionMessage::FollowUpFarewell));
    }

    #[tokio::test]
    async fn unrecognized_follow_up_replies_re_ask_the_reveal() {
        let source = ScriptedSource::new(vec![Ok(question("Paris"))]);
        let dialogue =
            ScriptedDialogue::with_replies(&["x", "x", "x", "what?", "hmm", "yes"]);

        let outcome =
            RoundController::new(&source, &dialogue).run().await.expect("session should finish");

        assert_eq!(outcome.end, SessionEnd::Exhausted);
        let reveals = dialogue
            .asked()
            .iter()
            .filter(|prompt| matches!(prompt, SessionPrompt::Reveal { .. }))
            .count();
        assert_eq!(reveals, 3);
    }

    #[tokio::test]
    async fn source_failure_aborts_before_any_dialogue() {
        let source =
            ScriptedSource::new(vec![Err(TriviaSourceError::Status(503))]);
        let dialogue = ScriptedDialogue::default();

        let result = RoundController::new(&source, &dialogue).run().await;

        assert!(matches!(result, Err(SessionError::Source(TriviaSourceError::Status(503)))));
        assert!(dialogue.asked().is_empty());
        assert!(dialogue.said().is_empty());
    }

    #[tokio::test]
    async fn source_failure_on_a_chained_round_surfaces_after_the_correct_feedback() {
        let source = ScriptedSource::new(vec![
            Ok(question("Paris")),
            Err(TriviaSourceError::Transport("connection reset".to_owned())),
        ]);
        let dialogue = ScriptedDialogue::with_replies(&["paris"]);

        let result = RoundController::new(&source, &dialogue).run().await;

        assert!(matches!(result, Err(SessionError::Source(_))));
        assert_eq!(dialogue.said(), vec![SessionMessage::Correct]);
    }
}
