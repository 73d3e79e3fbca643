//! Slack Integration - Socket Mode interface for the trivet bot
//!
//! This crate is the only place that knows about Slack:
//! - **Socket Mode** (`socket`) - transport seam and event loop with a
//!   reconnect policy (no public URL needed)
//! - **Events** (`events`) - envelope/event model, trigger vocabulary
//!   routing, and the handler dispatcher
//! - **Conversations** (`conversation`) - one active trivia dialogue per
//!   (channel, user), replies forwarded off the event loop
//! - **Messenger** (`messenger`) - outbound `chat.postMessage` client
//! - **Block Kit** (`blocks`) - question cards and the short feedback
//!   messages around them
//!
//! # Getting Started
//!
//! 1. Create a Slack app at https://api.slack.com/apps
//! 2. Enable Socket Mode and subscribe to message events
//! 3. Set env vars: `TRIVET_SLACK_APP_TOKEN`, `TRIVET_SLACK_BOT_TOKEN`
//!
//! # Architecture
//!
//! ```text
//! Slack Events → EventDispatcher → MessageHandler → ConversationRegistry
//!                                       │                  │
//!                                   triggers          active round
//!                                 (hello/bye/play)  (RoundController)
//!                                       ↓                  ↓
//!                                  Block Kit UI  ←  Messenger
//! ```

pub mod blocks;
pub mod conversation;
pub mod events;
pub mod messenger;
pub mod socket;
