use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    blocks::{channel_join_message, goodbye_message, greeting_message, MessageTemplate},
    conversation::ConversationKey,
    messenger::Messenger,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    ChannelJoin(ChannelJoinEvent),
    Installation(InstallationEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::Message(_) => SlackEventType::Message,
            Self::ChannelJoin(_) => SlackEventType::ChannelJoin,
            Self::Installation(_) => SlackEventType::Installation,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }

    /// Channel the runner should address replies to, when the event has one.
    pub fn reply_channel(&self) -> Option<&str> {
        match self {
            Self::Message(event) => Some(&event.channel_id),
            Self::ChannelJoin(event) => Some(&event.channel_id),
            Self::Installation(_) | Self::Unsupported { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message,
    ChannelJoin,
    Installation,
    Unsupported,
}

/// How a message reached the bot. Trigger words are only honored when the
/// bot was addressed; ambient channel chatter never starts a game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageScope {
    DirectMessage,
    DirectMention,
    Mention,
    Ambient,
}

impl MessageScope {
    pub fn is_addressed(self) -> bool {
        !matches!(self, Self::Ambient)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub scope: MessageScope,
}

impl MessageEvent {
    pub fn conversation_key(&self) -> ConversationKey {
        ConversationKey::new(&self.channel_id, &self.user_id)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChannelJoinEvent {
    pub channel_id: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallationEvent {
    /// User who installed the app, when the payload carries one.
    pub installer: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Greeting,
    Farewell,
    Play,
}

const GREETING_WORDS: &[&str] = &["hello", "hi", "greetings"];
const FAREWELL_WORDS: &[&str] = &["bye", "see you", "good night"];
const PLAY_WORDS: &[&str] = &["play"];

impl Trigger {
    /// Case-insensitive substring match, greeting before farewell before
    /// play when several words appear in the same message.
    pub fn classify(text: &str) -> Option<Self> {
        let lowered = text.to_lowercase();
        let contains_any = |words: &[&str]| words.iter().any(|word| lowered.contains(word));

        if contains_any(GREETING_WORDS) {
            Some(Self::Greeting)
        } else if contains_any(FAREWELL_WORDS) {
            Some(Self::Farewell)
        } else if contains_any(PLAY_WORDS) {
            Some(Self::Play)
        } else {
            None
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Responded(MessageTemplate),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("message handler failure: {0}")]
    Message(String),
    #[error("installation handler failure: {0}")]
    Installation(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

/// Session lifecycle seam the message handler drives. The production
/// implementation lives in [`crate::conversation::SessionLauncher`].
#[async_trait]
pub trait TriviaSessionService: Send + Sync {
    /// Routes `text` into an active session, returning `false` when no
    /// session is running for `key`.
    async fn forward_reply(&self, key: &ConversationKey, text: &str) -> bool;

    /// Starts a session for `key` unless one is already running.
    async fn start_session(&self, key: &ConversationKey) -> Result<(), EventHandlerError>;
}

#[derive(Default)]
pub struct NoopTriviaSessionService;

#[async_trait]
impl TriviaSessionService for NoopTriviaSessionService {
    async fn forward_reply(&self, _key: &ConversationKey, _text: &str) -> bool {
        false
    }

    async fn start_session(&self, _key: &ConversationKey) -> Result<(), EventHandlerError> {
        Ok(())
    }
}

pub struct MessageHandler<S> {
    sessions: S,
}

impl<S> MessageHandler<S>
where
    S: TriviaSessionService,
{
    pub fn new(sessions: S) -> Self {
        Self { sessions }
    }
}

#[async_trait]
impl<S> EventHandler for MessageHandler<S>
where
    S: TriviaSessionService,
{
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        // A running game owns every message from its player, including
        // ambient ones and trigger words like "play".
        if self.sessions.forward_reply(&event.conversation_key(), &event.text).await {
            return Ok(HandlerResult::Processed);
        }

        if !event.scope.is_addressed() {
            return Ok(HandlerResult::Ignored);
        }

        match Trigger::classify(&event.text) {
            Some(Trigger::Greeting) => Ok(HandlerResult::Responded(greeting_message())),
            Some(Trigger::Farewell) => Ok(HandlerResult::Responded(goodbye_message())),
            Some(Trigger::Play) => {
                self.sessions.start_session(&event.conversation_key()).await?;
                Ok(HandlerResult::Processed)
            }
            None => Ok(HandlerResult::Ignored),
        }
    }
}

pub struct ChannelJoinHandler;

#[async_trait]
impl EventHandler for ChannelJoinHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::ChannelJoin
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::ChannelJoin(_) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        Ok(HandlerResult::Responded(channel_join_message()))
    }
}

/// Greets the installing user over a direct message when the app is first
/// installed. Installations without a known installer are acknowledged and
/// skipped.
pub struct InstallationHandler {
    messenger: Arc<dyn Messenger>,
}

impl InstallationHandler {
    pub fn new(messenger: Arc<dyn Messenger>) -> Self {
        Self { messenger }
    }
}

#[async_trait]
impl EventHandler for InstallationHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Installation
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        _ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Installation(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let Some(installer) = &event.installer else {
            return Ok(HandlerResult::Processed);
        };

        let channel_id = self
            .messenger
            .open_direct_channel(installer)
            .await
            .map_err(|error| EventHandlerError::Installation(error.to_string()))?;

        for message in crate::blocks::install_messages() {
            self.messenger
                .post_message(&channel_id, &message)
                .await
                .map_err(|error| EventHandlerError::Installation(error.to_string()))?;
        }

        Ok(HandlerResult::Processed)
    }
}

pub fn default_dispatcher() -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(NoopTriviaSessionService));
    dispatcher.register(ChannelJoinHandler);
    dispatcher.register(InstallationHandler::new(Arc::new(
        crate::messenger::RecordingMessenger::new(),
    )));
    dispatcher
}
