use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

use crate::blocks::MessageTemplate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MessengerError {
    #[error("slack api request failed: {0}")]
    Transport(String),
    #[error("slack api returned status {0}")]
    Status(u16),
    #[error("slack api rejected the call: {0}")]
    Api(String),
}

/// Outbound message delivery. The trivia dialogue, the install greeting,
/// and the socket runner's handler responses all go through here.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), MessengerError>;

    /// Opens (or reuses) a direct-message channel with `user_id` and
    /// returns its channel id.
    async fn open_direct_channel(&self, user_id: &str) -> Result<String, MessengerError>;
}

/// Web API client: `chat.postMessage` / `conversations.open` with the bot
/// token as a bearer credential.
pub struct HttpMessenger {
    client: reqwest::Client,
    base_url: String,
    bot_token: SecretString,
}

impl HttpMessenger {
    pub fn new(base_url: impl Into<String>, bot_token: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            bot_token,
        }
    }

    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<ApiResponse, MessengerError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| MessengerError::Transport(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MessengerError::Status(status.as_u16()));
        }

        let payload: ApiResponse = response
            .json()
            .await
            .map_err(|error| MessengerError::Transport(error.to_string()))?;

        if !payload.ok {
            return Err(MessengerError::Api(
                payload.error.clone().unwrap_or_else(|| "unknown error".to_owned()),
            ));
        }

        Ok(payload)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    error: Option<String>,
    channel: Option<ApiChannel>,
}

#[derive(Debug, Deserialize)]
struct ApiChannel {
    id: String,
}

#[async_trait]
impl Messenger for HttpMessenger {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), MessengerError> {
        self.call(
            "chat.postMessage",
            json!({
                "channel": channel_id,
                "text": message.fallback_text,
                "blocks": message.blocks,
            }),
        )
        .await
        .map(|_| ())
    }

    async fn open_direct_channel(&self, user_id: &str) -> Result<String, MessengerError> {
        let payload = self.call("conversations.open", json!({ "users": user_id })).await?;
        payload
            .channel
            .map(|channel| channel.id)
            .ok_or_else(|| MessengerError::Api("conversations.open returned no channel".to_owned()))
    }
}

/// In-memory messenger that records every post; used across the crate's
/// tests and by the noop wiring.
#[derive(Default)]
pub struct RecordingMessenger {
    posts: tokio::sync::Mutex<Vec<(String, MessageTemplate)>>,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn posts(&self) -> Vec<(String, MessageTemplate)> {
        self.posts.lock().await.clone()
    }

    pub async fn fallbacks_for(&self, channel_id: &str) -> Vec<String> {
        self.posts()
            .await
            .into_iter()
            .filter(|(channel, _)| channel == channel_id)
            .map(|(_, message)| message.fallback_text)
            .collect()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<(), MessengerError> {
        self.posts.lock().await.push((channel_id.to_owned(), message.clone()));
        Ok(())
    }

    async fn open_direct_channel(&self, user_id: &str) -> Result<String, MessengerError> {
        Ok(format!("D-{user_id}"))
    }
}
