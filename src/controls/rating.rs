//! Two-button vote widget

use crate::channel::{
    ActionResponse, Event, InlineButton, InlineKeyboard, MessageId, MessageRef, SendOptions,
};
use crate::config::Services;
use crate::controller::{Call, Common, Controller, Step, Texter};
use crate::error::{BoxError, ControlError};
use crate::i18n::{MSG_ALREADY_VOTED, MSG_UNEXPECTED, MSG_VOTE_COUNTED};
use crate::layout::{action_token, pack_even, Button, DEFAULT_BUTTONS_PER_ROW};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

const UP: &str = "↑";
const DOWN: &str = "↓";

/// Result of recording a vote, carrying the button's new counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Counted(i64),
    AlreadyVoted(i64),
}

/// Storage of votes.
///
/// Presses are serialized per control, but implementations must still
/// reject double votes by the same user themselves.
#[async_trait]
pub trait VoteCounter: Send + Sync {
    async fn vote(
        &self,
        call: &Call<'_>,
        message: MessageRef,
        button: &Button,
    ) -> Result<Vote, BoxError>;
}

pub struct Rating {
    common: Common,
    text: Box<dyn Texter>,
    counter: Box<dyn VoteCounter>,
    buttons: [Button; 2],
    show_counter: bool,
    allow_unvote: bool,
    // button state per rendered message
    state: Mutex<HashMap<MessageRef, [Button; 2]>>,
}

impl Rating {
    pub fn new(
        name: impl Into<String>,
        services: Services,
        text: impl Texter + 'static,
        counter: impl VoteCounter + 'static,
    ) -> Self {
        Self {
            common: Common::new(name, services),
            text: Box::new(text),
            counter: Box::new(counter),
            buttons: [Button::new(UP), Button::new(DOWN)],
            show_counter: false,
            allow_unvote: false,
            state: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_buttons(mut self, buttons: [Button; 2]) -> Self {
        self.buttons = buttons;
        self
    }

    /// Show counters next to button names.
    pub fn show_counter(mut self, show: bool) -> Self {
        self.show_counter = show;
        self
    }

    /// Allow users to take back their vote.
    pub fn allow_unvote(mut self, allow: bool) -> Self {
        self.allow_unvote = allow;
        self
    }

    pub fn with_send_options(mut self, options: SendOptions) -> Self {
        self.common.send_options = options;
        self
    }

    fn keyboard(&self, buttons: &[Button; 2]) -> InlineKeyboard {
        let row = buttons
            .iter()
            .enumerate()
            .map(|(index, button)| InlineButton {
                label: button.label(self.show_counter),
                action: action_token(self.common.name(), &button.name),
                data: index.to_string(),
            })
            .collect();
        InlineKeyboard::new(pack_even(row, DEFAULT_BUTTONS_PER_ROW))
    }

    async fn respond(&self, event: &Event, response: ActionResponse) {
        let Some(press) = event.press() else {
            return;
        };
        if let Err(e) = self.common.channel().respond(press, response).await {
            tracing::warn!(
                control = %self.common.name(),
                error = %e,
                "Failed to answer button press"
            );
        }
    }
}

#[async_trait]
impl Controller for Rating {
    fn name(&self) -> &str {
        self.common.name()
    }

    async fn handle(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        let call = self.common.call(step, event);
        let text = self
            .text
            .text(&call)
            .await
            .map_err(|e| ControlError::text(self.common.name(), e))?;
        let keyboard = self.keyboard(&self.buttons);
        let handler = step.action_handler();
        for button in keyboard.buttons() {
            self.common
                .channel()
                .register_action(&button.action, handler.clone());
        }

        let options = self.common.send_options.with_keyboard(keyboard);
        let message = self.common.send_or_edit(step, event, &text, &options).await?;
        self.state
            .lock()
            .await
            .insert(message, self.buttons.clone());
        self.common.register(event, message);
        step.handle_next(event).await
    }

    async fn on_action(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        let Some(press) = event.press() else {
            return Ok(());
        };
        self.common.log_callback(event, press);
        let call = self.common.call(step, event);

        let Some(index) = press.data.parse::<usize>().ok().filter(|&i| i < 2) else {
            tracing::warn!(
                control = %self.common.name(),
                data = %press.data,
                "Invalid button index"
            );
            self.respond(event, ActionResponse::alert(call.tr(MSG_UNEXPECTED)))
                .await;
            return Ok(());
        };

        let mut state = self.state.lock().await;
        let buttons = state
            .entry(press.message)
            .or_insert_with(|| self.buttons.clone());

        let vote = match self.counter.vote(&call, press.message, &buttons[index]).await {
            Ok(vote) => vote,
            Err(e) => {
                tracing::error!(control = %self.common.name(), error = %e, "Failed to count vote");
                self.respond(event, ActionResponse::alert(call.tr(MSG_UNEXPECTED)))
                    .await;
                return Err(ControlError::callback(self.common.name(), e));
            }
        };
        let (count, already_voted) = match vote {
            Vote::Counted(n) => (n, false),
            Vote::AlreadyVoted(n) => (n, true),
        };
        buttons[index].counter = count;
        let keyboard = self.keyboard(buttons);

        match self
            .common
            .channel()
            .edit_keyboard(press.message, Some(&keyboard))
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_not_modified() => {}
            Err(e) => {
                tracing::error!(
                    control = %self.common.name(),
                    error = %e,
                    "Failed to update rating"
                );
                self.respond(event, ActionResponse::alert(call.tr(MSG_UNEXPECTED)))
                    .await;
                return Err(e.into());
            }
        }
        drop(state);

        let text = if already_voted && !self.allow_unvote {
            MSG_ALREADY_VOTED
        } else {
            MSG_VOTE_COUNTED
        };
        self.respond(event, ActionResponse::text(call.tr(text)))
            .await;
        Ok(())
    }

    fn value(&self, _recipient: &str) -> Option<String> {
        None
    }

    fn outgoing_message_id(&self, recipient: &str) -> Option<MessageId> {
        self.common.registry().last_outgoing_id(recipient)
    }

    fn set_overwrite(&self, overwrite: bool) {
        self.common.set_overwrite(overwrite);
    }
}
