//! Trait abstractions for channel I/O
//!
//! Controls talk to the chat platform only through these traits, which lets
//! them run against a mock in tests and against any transport in production.

use super::error::ChannelError;
use super::types::{
    ActionPress, ActionResponse, ChatId, Event, InlineKeyboard, MemberRole, MessageRef,
    SendOptions, Sender,
};
use crate::error::ControlError;
use async_trait::async_trait;
use std::sync::Arc;

/// Outbound side of a chat platform
#[async_trait]
pub trait Channel: Send + Sync {
    /// Send a new message to a chat
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError>;

    /// Replace the text (and keyboard) of an existing message
    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError>;

    /// Replace only the keyboard of an existing message
    async fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, ChannelError>;

    /// Acknowledge a button press
    async fn respond(&self, press: &ActionPress, response: ActionResponse)
        -> Result<(), ChannelError>;

    /// Route presses of buttons carrying `action` to `handler`
    fn register_action(&self, action: &str, handler: Arc<dyn ActionHandler>);

    /// Show the "typing" indicator
    async fn notify_typing(&self, chat: ChatId) -> Result<(), ChannelError>;

    /// Look up the role of a user in a group or channel
    async fn resolve_membership(
        &self,
        group: &str,
        user: &Sender,
    ) -> Result<MemberRole, ChannelError>;
}

/// Receiver of button presses
#[async_trait]
pub trait ActionHandler: Send + Sync {
    async fn on_action(&self, event: Event) -> Result<(), ControlError>;
}

/// Source of localized strings
pub trait Translator: Send + Sync {
    /// Resolve `key` for `lang`, falling back to `fallback` and finally to
    /// the key itself.
    fn resolve(&self, lang: &str, key: &str, fallback: &str) -> String;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: Channel + ?Sized> Channel for Arc<T> {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError> {
        (**self).send(chat, text, options).await
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError> {
        (**self).edit(message, text, options).await
    }

    async fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, ChannelError> {
        (**self).edit_keyboard(message, keyboard).await
    }

    async fn respond(
        &self,
        press: &ActionPress,
        response: ActionResponse,
    ) -> Result<(), ChannelError> {
        (**self).respond(press, response).await
    }

    fn register_action(&self, action: &str, handler: Arc<dyn ActionHandler>) {
        (**self).register_action(action, handler);
    }

    async fn notify_typing(&self, chat: ChatId) -> Result<(), ChannelError> {
        (**self).notify_typing(chat).await
    }

    async fn resolve_membership(
        &self,
        group: &str,
        user: &Sender,
    ) -> Result<MemberRole, ChannelError> {
        (**self).resolve_membership(group, user).await
    }
}

impl<T: Translator + ?Sized> Translator for Arc<T> {
    fn resolve(&self, lang: &str, key: &str, fallback: &str) -> String {
        (**self).resolve(lang, key, fallback)
    }
}
