use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};
use trivet_game::{
    DialogueDriver, DialogueError, RoundController, SessionMessage, SessionPrompt, TriviaSource,
};

use crate::{
    blocks::{error_message, render_session_message, render_session_prompt},
    events::{EventHandlerError, TriviaSessionService},
    messenger::Messenger,
};

/// Scope of one trivia session: a single user in a single channel. Another
/// user in the same channel plays their own game.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConversationKey {
    pub channel_id: String,
    pub user_id: String,
}

impl ConversationKey {
    pub fn new(channel_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self { channel_id: channel_id.into(), user_id: user_id.into() }
    }
}

const REPLY_BUFFER: usize = 16;

/// Tracks which conversation scopes have a live session and hands their
/// incoming replies to the session task that owns them.
#[derive(Default)]
pub struct ConversationRegistry {
    sessions: Mutex<HashMap<ConversationKey, mpsc::Sender<String>>>,
}

impl ConversationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `key` for a new session. Returns `None` when a session is
    /// already running there; the reply receiver otherwise.
    pub async fn begin(&self, key: &ConversationKey) -> Option<mpsc::Receiver<String>> {
        let mut sessions = self.sessions.lock().await;
        if let Some(sender) = sessions.get(key) {
            if !sender.is_closed() {
                return None;
            }
            // Session task ended without deregistering; reclaim the slot.
            sessions.remove(key);
        }

        let (tx, rx) = mpsc::channel(REPLY_BUFFER);
        sessions.insert(key.clone(), tx);
        Some(rx)
    }

    /// Delivers `text` to the session owning `key`. Returns `false` when no
    /// live session claims the scope, dropping stale entries on the way.
    pub async fn forward(&self, key: &ConversationKey, text: &str) -> bool {
        let mut sessions = self.sessions.lock().await;
        let Some(sender) = sessions.get(key) else {
            return false;
        };

        if sender.send(text.to_owned()).await.is_err() {
            sessions.remove(key);
            return false;
        }
        true
    }

    pub async fn end(&self, key: &ConversationKey) {
        self.sessions.lock().await.remove(key);
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Bridges the round controller's dialogue seam onto Slack: statements and
/// prompts render to Block Kit cards, replies arrive over the registry's
/// channel for this conversation scope.
pub struct SlackDialogue {
    messenger: Arc<dyn Messenger>,
    channel_id: String,
    replies: Mutex<mpsc::Receiver<String>>,
}

impl SlackDialogue {
    pub fn new(
        messenger: Arc<dyn Messenger>,
        channel_id: impl Into<String>,
        replies: mpsc::Receiver<String>,
    ) -> Self {
        Self { messenger, channel_id: channel_id.into(), replies: Mutex::new(replies) }
    }
}

#[async_trait]
impl DialogueDriver for SlackDialogue {
    async fn say(&self, message: SessionMessage) -> Result<(), DialogueError> {
        self.messenger
            .post_message(&self.channel_id, &render_session_message(&message))
            .await
            .map_err(|error| DialogueError::Delivery(error.to_string()))
    }

    async fn ask(&self, prompt: SessionPrompt) -> Result<String, DialogueError> {
        self.messenger
            .post_message(&self.channel_id, &render_session_prompt(&prompt))
            .await
            .map_err(|error| DialogueError::Delivery(error.to_string()))?;

        self.replies
            .lock()
            .await
            .recv()
            .await
            .ok_or_else(|| DialogueError::Closed(self.channel_id.clone()))
    }
}

/// Production [`TriviaSessionService`]: claims the conversation scope and
/// runs a [`RoundController`] on its own task until the session ends.
pub struct SessionLauncher {
    source: Arc<dyn TriviaSource>,
    messenger: Arc<dyn Messenger>,
    registry: Arc<ConversationRegistry>,
    attempts: u8,
}

impl SessionLauncher {
    pub fn new(
        source: Arc<dyn TriviaSource>,
        messenger: Arc<dyn Messenger>,
        registry: Arc<ConversationRegistry>,
        attempts: u8,
    ) -> Self {
        Self { source, messenger, registry, attempts }
    }
}

#[async_trait]
impl TriviaSessionService for SessionLauncher {
    async fn forward_reply(&self, key: &ConversationKey, text: &str) -> bool {
        self.registry.forward(key, text).await
    }

    async fn start_session(&self, key: &ConversationKey) -> Result<(), EventHandlerError> {
        let Some(replies) = self.registry.begin(key).await else {
            // One game at a time per scope; the running session already
            // consumed this message if it wanted it.
            return Ok(());
        };

        let source = Arc::clone(&self.source);
        let messenger = Arc::clone(&self.messenger);
        let registry = Arc::clone(&self.registry);
        let key = key.clone();
        let attempts = self.attempts;

        tokio::spawn(async move {
            let dialogue = SlackDialogue::new(Arc::clone(&messenger), &key.channel_id, replies);
            let controller = RoundController::with_attempts(source, dialogue, attempts);

            match controller.run().await {
                Ok(outcome) => {
                    info!(
                        channel_id = %key.channel_id,
                        user_id = %key.user_id,
                        rounds_played = outcome.rounds_played,
                        "trivia session finished"
                    );
                }
                Err(error) => {
                    warn!(
                        channel_id = %key.channel_id,
                        user_id = %key.user_id,
                        %error,
                        "trivia session aborted"
                    );
                    let correlation_id = format!("{}:{}", key.channel_id, key.user_id);
                    let notice = error_message(
                        "Something went wrong fetching trivia. Try `play` again later.",
                        &correlation_id,
                    );
                    if let Err(post_error) = messenger.post_message(&key.channel_id, &notice).await
                    {
                        warn!(%post_error, "failed to deliver session error notice");
                    }
                }
            }

            registry.end(&key).await;
        });

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use async_trait::async_trait;
    use tokio::time::timeout;
    use trivet_core::TriviaQuestion;
    use trivet_game::{TriviaSource, TriviaSourceError};

    use super::{ConversationKey, ConversationRegistry, SessionLauncher};
    use crate::{events::TriviaSessionService, messenger::RecordingMessenger};

    struct SingleQuestionSource;

    #[async_trait]
    impl TriviaSource for SingleQuestionSource {
        async fn fetch_random(&self) -> Result<TriviaQuestion, TriviaSourceError> {
            Ok(TriviaQuestion {
                category: "geography".to_owned(),
                prompt: "Capital of France?".to_owned(),
                raw_answer: "Paris".to_owned(),
            })
        }
    }

    struct FailingSource;

    #[async_trait]
    impl TriviaSource for FailingSource {
        async fn fetch_random(&self) -> Result<TriviaQuestion, TriviaSourceError> {
            Err(TriviaSourceError::Status(503))
        }
    }

    #[tokio::test]
    async fn registry_rejects_a_second_session_for_the_same_scope() {
        let registry = ConversationRegistry::new();
        let key = ConversationKey::new("C1", "U1");

        let first = registry.begin(&key).await;
        assert!(first.is_some());
        assert!(registry.begin(&key).await.is_none());

        registry.end(&key).await;
        assert!(registry.begin(&key).await.is_some());
    }

    #[tokio::test]
    async fn registry_reclaims_a_scope_whose_task_died() {
        let registry = ConversationRegistry::new();
        let key = ConversationKey::new("C1", "U1");

        // Receiver dropped without `end`, as a panicked task would leave it.
        drop(registry.begin(&key).await.expect("first claim"));

        assert!(!registry.forward(&key, "paris").await);
        assert!(registry.begin(&key).await.is_some());
    }

    #[tokio::test]
    async fn forward_reports_missing_sessions() {
        let registry = ConversationRegistry::new();
        let key = ConversationKey::new("C1", "U1");

        assert!(!registry.forward(&key, "hello").await);

        let mut replies = registry.begin(&key).await.expect("claim");
        assert!(registry.forward(&key, "paris").await);
        assert_eq!(replies.recv().await.as_deref(), Some("paris"));
    }

    #[tokio::test]
    async fn launcher_runs_a_full_session_and_frees_the_scope() {
        let messenger = Arc::new(RecordingMessenger::new());
        let registry = Arc::new(ConversationRegistry::new());
        let launcher = SessionLauncher::new(
            Arc::new(SingleQuestionSource),
            messenger.clone(),
            registry.clone(),
            3,
        );
        let key = ConversationKey::new("C1", "U1");

        launcher.start_session(&key).await.expect("start");

        // The question card posts before the session will accept a reply.
        timeout(Duration::from_secs(1), async {
            while !launcher.forward_reply(&key, "stop").await {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session should come up");

        timeout(Duration::from_secs(1), async {
            while registry.active_count().await != 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session should deregister");

        let fallbacks = messenger.fallbacks_for("C1").await;
        assert_eq!(fallbacks.last().map(String::as_str), Some("Have a nice day!"));
    }

    #[tokio::test]
    async fn launcher_posts_an_error_notice_when_the_source_fails() {
        let messenger = Arc::new(RecordingMessenger::new());
        let registry = Arc::new(ConversationRegistry::new());
        let launcher =
            SessionLauncher::new(Arc::new(FailingSource), messenger.clone(), registry.clone(), 3);
        let key = ConversationKey::new("C2", "U2");

        launcher.start_session(&key).await.expect("start");

        timeout(Duration::from_secs(1), async {
            while registry.active_count().await != 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session should deregister");

        let fallbacks = messenger.fallbacks_for("C2").await;
        assert_eq!(fallbacks.len(), 1);
        assert!(fallbacks[0].contains("Something went wrong"));
    }

    #[tokio::test]
    async fn second_start_for_an_active_scope_is_a_no_op() {
        let messenger = Arc::new(RecordingMessenger::new());
        let registry = Arc::new(ConversationRegistry::new());
        let launcher = SessionLauncher::new(
            Arc::new(SingleQuestionSource),
            messenger.clone(),
            registry.clone(),
            3,
        );
        let key = ConversationKey::new("C3", "U3");

        launcher.start_session(&key).await.expect("first start");
        timeout(Duration::from_secs(1), async {
            while registry.active_count().await == 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("session should register");

        launcher.start_session(&key).await.expect("second start");
        assert_eq!(registry.active_count().await, 1);

        launcher.forward_reply(&key, "stop").await;
    }
}
