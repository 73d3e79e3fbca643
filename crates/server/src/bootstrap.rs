use std::sync::Arc;

use thiserror::Error;
use tracing::info;
use trivet_core::config::{AppConfig, ConfigError, LoadOptions};
use trivet_game::HttpTriviaSource;
use trivet_slack::{
    conversation::{ConversationRegistry, SessionLauncher},
    events::{ChannelJoinHandler, EventDispatcher, InstallationHandler, MessageHandler},
    messenger::{HttpMessenger, Messenger},
    socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner},
};

pub struct Application {
    pub config: AppConfig,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let messenger: Arc<dyn Messenger> = Arc::new(HttpMessenger::new(
        config.slack.api_base_url.clone(),
        config.slack.bot_token.clone(),
    ));
    let dispatcher = build_dispatcher(
        &config.trivia.source_url,
        config.trivia.attempts,
        Arc::clone(&messenger),
    );

    let slack_runner = SocketModeRunner::new(
        Arc::new(NoopSocketTransport),
        dispatcher,
        messenger,
        ReconnectPolicy::default(),
    );

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        "application bootstrap complete"
    );

    Ok(Application { config, slack_runner })
}

/// Wires the session plumbing behind the event handlers: one trivia source,
/// one messenger, one registry shared by every conversation scope.
fn build_dispatcher(
    source_url: &str,
    attempts: u8,
    messenger: Arc<dyn Messenger>,
) -> EventDispatcher {
    let source = Arc::new(HttpTriviaSource::new(source_url));
    let registry = Arc::new(ConversationRegistry::new());
    let launcher = SessionLauncher::new(source, Arc::clone(&messenger), registry, attempts);

    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MessageHandler::new(launcher));
    dispatcher.register(ChannelJoinHandler);
    dispatcher.register(InstallationHandler::new(messenger));
    dispatcher
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use trivet_core::config::{ConfigOverrides, LoadOptions};
    use trivet_slack::messenger::RecordingMessenger;

    use super::{bootstrap, build_dispatcher};

    fn valid_overrides() -> LoadOptions {
        LoadOptions {
            overrides: ConfigOverrides {
                slack_app_token: Some("xapp-test".to_string()),
                slack_bot_token: Some("xoxb-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        }
    }

    #[tokio::test]
    async fn bootstrap_fails_fast_without_required_slack_tokens() {
        let result = bootstrap(LoadOptions::default()).await;

        let message = result.err().expect("missing tokens should fail").to_string();
        assert!(message.contains("slack.app_token"));
    }

    #[tokio::test]
    async fn bootstrap_succeeds_with_valid_overrides() {
        let app = bootstrap(valid_overrides()).await.expect("bootstrap should succeed");
        assert_eq!(app.config.trivia.attempts, 3);
    }

    #[test]
    fn dispatcher_registers_all_event_handlers() {
        let dispatcher = build_dispatcher(
            "https://questions.example/random",
            3,
            Arc::new(RecordingMessenger::new()),
        );
        assert_eq!(dispatcher.handler_count(), 3);
    }
}
