//! Buttons attached to a post
//!
//! Every button of the markup routes to a single handler, which gets the
//! pressed label as the press data and must handle all of them.

use crate::channel::{ActionHandler, ChatId, InlineButton, InlineKeyboard, MessageRef, SendOptions};
use crate::config::Services;
use crate::error::ControlError;
use crate::layout::{action_token, clamp_per_row, pack_even, pack_pattern, LayoutError};
use std::sync::Arc;

pub struct PostButtons {
    scope: String,
    services: Services,
    handler: Arc<dyn ActionHandler>,
    per_row: usize,
}

impl PostButtons {
    /// `scope` keeps action tokens apart from other button sets with the
    /// same labels.
    pub fn new(
        scope: impl Into<String>,
        services: Services,
        handler: Arc<dyn ActionHandler>,
    ) -> Self {
        let per_row = services.config.max_buttons_per_row;
        Self {
            scope: scope.into(),
            services,
            handler,
            per_row,
        }
    }

    /// Maximum buttons per row. Out of range values fall back to the default.
    pub fn with_max_buttons(mut self, per_row: usize) -> Self {
        self.per_row = clamp_per_row(per_row);
        self
    }

    /// Builds the keyboard for `labels` and routes its buttons to the
    /// handler. A non-empty `pattern` lays out the rows instead of the
    /// per-row maximum. Labels must be unique.
    pub fn markup<S: Into<String>>(
        &self,
        labels: impl IntoIterator<Item = S>,
        pattern: &[usize],
    ) -> Result<InlineKeyboard, LayoutError> {
        let buttons: Vec<InlineButton> = labels
            .into_iter()
            .map(|label| {
                let label = label.into();
                InlineButton {
                    action: action_token(&self.scope, &label),
                    data: label.clone(),
                    label,
                }
            })
            .collect();
        let rows = if pattern.is_empty() {
            pack_even(buttons, self.per_row)
        } else {
            pack_pattern(buttons, pattern)?
        };
        let keyboard = InlineKeyboard::new(rows);
        for button in keyboard.buttons() {
            self.services
                .channel
                .register_action(&button.action, self.handler.clone());
        }
        tracing::debug!(scope = %self.scope, shape = ?keyboard.shape(), "Post buttons registered");
        Ok(keyboard)
    }

    /// Sends a post carrying the buttons.
    pub async fn send<S: Into<String>>(
        &self,
        chat: ChatId,
        text: &str,
        labels: impl IntoIterator<Item = S>,
        pattern: &[usize],
    ) -> Result<MessageRef, ControlError> {
        let keyboard = self.markup(labels, pattern)?;
        let options = SendOptions::default().with_keyboard(keyboard);
        Ok(self.services.channel.send(chat, text, &options).await?)
    }
}
