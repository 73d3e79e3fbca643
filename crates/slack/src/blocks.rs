use serde::Serialize;
use trivet_game::{SessionMessage, SessionPrompt};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TextObject {
    Plain { text: String },
    Mrkdwn { text: String },
}

impl TextObject {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::Plain { text: text.into() }
    }

    pub fn mrkdwn(text: impl Into<String>) -> Self {
        Self::Mrkdwn { text: text.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Section { block_id: String, text: TextObject },
    Context { block_id: String, elements: Vec<TextObject> },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MessageTemplate {
    pub fallback_text: String,
    pub blocks: Vec<Block>,
}

pub struct MessageBuilder {
    fallback_text: String,
    blocks: Vec<Block>,
}

impl MessageBuilder {
    pub fn new(fallback_text: impl Into<String>) -> Self {
        Self { fallback_text: fallback_text.into(), blocks: Vec::new() }
    }

    pub fn section<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut SectionBuilder),
    {
        let mut builder = SectionBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Section { block_id: block_id.into(), text: builder.build() });
        self
    }

    pub fn context<F>(mut self, block_id: impl Into<String>, build: F) -> Self
    where
        F: FnOnce(&mut ContextBuilder),
    {
        let mut builder = ContextBuilder::default();
        build(&mut builder);
        self.blocks.push(Block::Context { block_id: block_id.into(), elements: builder.build() });
        self
    }

    pub fn build(self) -> MessageTemplate {
        MessageTemplate { fallback_text: self.fallback_text, blocks: self.blocks }
    }
}

#[derive(Default)]
pub struct SectionBuilder {
    text: Option<TextObject>,
}

impl SectionBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.text = Some(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> TextObject {
        self.text.unwrap_or_else(|| TextObject::plain(""))
    }
}

#[derive(Default)]
pub struct ContextBuilder {
    elements: Vec<TextObject>,
}

impl ContextBuilder {
    pub fn plain(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::plain(text));
        self
    }

    pub fn mrkdwn(&mut self, text: impl Into<String>) -> &mut Self {
        self.elements.push(TextObject::mrkdwn(text));
        self
    }

    fn build(self) -> Vec<TextObject> {
        self.elements
    }
}

/// The question card: category context above the prompt text.
pub fn question_card(category: &str, prompt: &str) -> MessageTemplate {
    MessageBuilder::new(format!("[{category}] {prompt}"))
        .context("trivia.question.category.v1", |context| {
            context.mrkdwn(format!("*Category:* {category}"));
        })
        .section("trivia.question.prompt.v1", |section| {
            section.plain(prompt);
        })
        .context("trivia.question.hint.v1", |context| {
            context.plain("Reply with your answer, `next` for a new question, or `stop` to quit.");
        })
        .build()
}

pub fn correct_message() -> MessageTemplate {
    plain_message("trivia.feedback.correct.v1", "Correct!")
}

pub fn attempts_message(attempts_remaining: u8) -> MessageTemplate {
    plain_message(
        "trivia.feedback.attempts.v1",
        format!("Nope, try again. {attempts_remaining} attempts left."),
    )
}

/// Attempts exhausted: reveal the answer and offer the lookup branch.
pub fn reveal_message(raw_answer: &str) -> MessageTemplate {
    MessageBuilder::new(format!("The answer is: {raw_answer}"))
        .section("trivia.reveal.answer.v1", |section| {
            section.mrkdwn(format!("The answer is: *{raw_answer}*"));
        })
        .section("trivia.reveal.offer.v1", |section| {
            section.plain("Do you want to learn about it?");
        })
        .build()
}

pub fn farewell_message() -> MessageTemplate {
    plain_message("trivia.farewell.v1", "Have a nice day!")
}

pub fn followup_farewell_message() -> MessageTemplate {
    plain_message("trivia.followup.farewell.v1", "Ok! See you!")
}

pub fn lookup_intro_message() -> MessageTemplate {
    plain_message("trivia.lookup.intro.v1", "Let me google it for you!")
}

pub fn lookup_link_message(url: &str) -> MessageTemplate {
    plain_message("trivia.lookup.link.v1", url)
}

pub fn greeting_message() -> MessageTemplate {
    plain_message("greeting.hello.v1", "Hello!")
}

pub fn goodbye_message() -> MessageTemplate {
    plain_message("greeting.goodbye.v1", "See you later!")
}

pub fn channel_join_message() -> MessageTemplate {
    plain_message("presence.channel_join.v1", "I'm here!")
}

/// The two onboarding lines sent to whoever installed the bot.
pub fn install_messages() -> [MessageTemplate; 2] {
    [
        plain_message("install.welcome.v1", "I am a bot that has just joined your team"),
        plain_message(
            "install.invite.v1",
            "You must now /invite me to a channel so that I can be of use!",
        ),
    ]
}

pub fn error_message(summary: &str, correlation_id: &str) -> MessageTemplate {
    MessageBuilder::new(summary.to_owned())
        .section("trivia.error.summary.v1", |section| {
            section.mrkdwn(format!(":warning: {summary}"));
        })
        .context("trivia.error.context.v1", |context| {
            context.plain(format!("Correlation ID: {correlation_id}"));
        })
        .build()
}

/// Renders a controller statement into its Slack message.
pub fn render_session_message(message: &SessionMessage) -> MessageTemplate {
    match message {
        SessionMessage::Correct => correct_message(),
        SessionMessage::TryAgain { attempts_remaining } => attempts_message(*attempts_remaining),
        SessionMessage::Farewell => farewell_message(),
        SessionMessage::LookupIntro => lookup_intro_message(),
        SessionMessage::LookupLink { url } => lookup_link_message(url),
        SessionMessage::FollowUpFarewell => followup_farewell_message(),
    }
}

/// Renders a controller prompt into its Slack message.
pub fn render_session_prompt(prompt: &SessionPrompt) -> MessageTemplate {
    match prompt {
        SessionPrompt::Question { category, prompt } => question_card(category, prompt),
        SessionPrompt::Reveal { raw_answer } => reveal_message(raw_answer),
    }
}

fn plain_message(block_id: &str, text: impl Into<String>) -> MessageTemplate {
    let text = text.into();
    MessageBuilder::new(text.clone())
        .section(block_id, |section| {
            section.plain(text);
        })
        .build()
}

#[cfg(test)]
mod tests {
    use trivet_game::{SessionMessage, SessionPrompt};

    use super::{
        attempts_message, error_message, install_messages, question_card,
        render_session_message, render_session_prompt, reveal_message, Block, MessageBuilder,
        TextObject,
    };

    #[test]
    fn message_builder_creates_typed_block_structure() {
        let message = MessageBuilder::new("fallback")
            .context("trivia.category.v1", |context| {
                context.mrkdwn("*Category:* History");
            })
            .section("trivia.prompt.v1", |section| {
                section.plain("This year the Bastille fell");
            })
            .build();

        assert_eq!(message.blocks.len(), 2);
        assert!(matches!(
            &message.blocks[0],
            Block::Context { block_id, elements }
                if block_id == "trivia.category.v1" && elements.len() == 1
        ));
        assert!(matches!(
            &message.blocks[1],
            Block::Section { block_id, text: TextObject::Plain { .. } }
                if block_id == "trivia.prompt.v1"
        ));
    }

    #[test]
    fn question_card_carries_category_and_prompt() {
        let message = question_card("World Capitals", "This city hosts the Eiffel Tower");

        assert!(message.fallback_text.contains("World Capitals"));
        assert!(matches!(
            &message.blocks[0],
            Block::Context { elements, .. } if matches!(
                elements.first(),
                Some(TextObject::Mrkdwn { text }) if text.contains("World Capitals")
            )
        ));
        assert!(matches!(
            &message.blocks[1],
            Block::Section { text: TextObject::Plain { text }, .. }
                if text.contains("Eiffel Tower")
        ));
    }

    #[test]
    fn reveal_message_bolds_the_answer_and_offers_the_lookup() {
        let message = reveal_message("(The) Eiffel Tower");
        assert!(matches!(
            &message.blocks[0],
            Block::Section { text: TextObject::Mrkdwn { text }, .. }
                if text.contains("*(The) Eiffel Tower*")
        ));
        assert!(matches!(
            &message.blocks[1],
            Block::Section { text: TextObject::Plain { text }, .. }
                if text.contains("learn about it")
        ));
    }

    #[test]
    fn attempts_message_counts_down() {
        assert!(attempts_message(2).fallback_text.contains("2 attempts left"));
    }

    #[test]
    fn error_template_contains_correlation_id() {
        let message = error_message("Cannot fetch a question", "env-123");
        assert!(matches!(
            &message.blocks[1],
            Block::Context { elements, .. } if matches!(
                elements.first(),
                Some(TextObject::Plain { text }) if text.contains("env-123")
            )
        ));
    }

    #[test]
    fn install_onboarding_has_two_lines_in_order() {
        let [first, second] = install_messages();
        assert!(first.fallback_text.contains("just joined your team"));
        assert!(second.fallback_text.contains("/invite"));
    }

    #[test]
    fn session_payloads_render_to_the_matching_templates() {
        let correct = render_session_message(&SessionMessage::Correct);
        assert_eq!(correct.fallback_text, "Correct!");

        let link = render_session_message(&SessionMessage::LookupLink {
            url: "https://lmgtfy.com/?q=Paris".to_owned(),
        });
        assert!(link.fallback_text.contains("lmgtfy"));

        let card = render_session_prompt(&SessionPrompt::Question {
            category: "History".to_owned(),
            prompt: "p".to_owned(),
        });
        assert!(card.fallback_text.contains("History"));

        let reveal = render_session_prompt(&SessionPrompt::Reveal {
            raw_answer: "Paris".to_owned(),
        });
        assert!(reveal.fallback_text.contains("Paris"));
    }
}
