//! Single-choice list of inline buttons
//!
//! Rendering sends the text with one button per value. A press runs
//! [`Choices::choose`]; depending on the [`Outcome`] the control stores the
//! pressed value and advances, asks the user to choose again, or navigates
//! back.

use crate::channel::{
    ActionPress, ActionResponse, Event, InlineButton, InlineKeyboard, MessageId, MessageRef,
    SendOptions,
};
use crate::config::Services;
use crate::controller::{Call, Common, Controller, Step, Texter};
use crate::error::{BoxError, ConfigError, ControlError};
use crate::i18n::{MSG_CHOOSE_VAL, MSG_OK, MSG_UNEXPECTED};
use crate::layout::{action_token, clamp_per_row, pack_even, pack_pattern, validate_pattern};
use crate::outcome::Outcome;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};

/// Text, values and validation of a picklist
#[async_trait]
pub trait Choices: Send + Sync {
    async fn text(&self, call: &Call<'_>) -> Result<String, BoxError>;

    async fn values(&self, call: &Call<'_>) -> Result<Vec<String>, BoxError>;

    /// Validate the pressed value.
    async fn choose(&self, call: &Call<'_>, value: &str) -> Outcome;

    /// Report a failure of [`Choices::values`] to the user. Returns `false`
    /// to let the control send its generic error message instead.
    async fn on_error(&self, _call: &Call<'_>, _err: &BoxError) -> bool {
        false
    }
}

type ChooseFn = Box<dyn for<'a, 'b> Fn(&Call<'a>, &'b str) -> Outcome + Send + Sync>;

/// Choices with fixed text and values
pub struct StaticChoices {
    text: String,
    values: Vec<String>,
    choose: ChooseFn,
}

impl StaticChoices {
    /// Every pressed value is accepted.
    pub fn new<S: Into<String>>(
        text: impl Into<String>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            text: text.into(),
            values: values.into_iter().map(Into::into).collect(),
            choose: Box::new(|_, _| Outcome::Accept),
        }
    }

    pub fn on_choose<F>(mut self, choose: F) -> Self
    where
        F: for<'a, 'b> Fn(&Call<'a>, &'b str) -> Outcome + Send + Sync + 'static,
    {
        self.choose = Box::new(choose);
        self
    }
}

#[async_trait]
impl Choices for StaticChoices {
    async fn text(&self, _call: &Call<'_>) -> Result<String, BoxError> {
        Ok(self.text.clone())
    }

    async fn values(&self, _call: &Call<'_>) -> Result<Vec<String>, BoxError> {
        Ok(self.values.clone())
    }

    async fn choose(&self, call: &Call<'_>, value: &str) -> Outcome {
        (self.choose)(call, value)
    }
}

pub struct Picklist {
    common: Common,
    choices: Box<dyn Choices>,
    remove_buttons: AtomicBool,
    no_update: bool,
    choose_hint: bool,
    back: Option<Box<dyn Texter>>,
    pattern: Vec<usize>,
    per_row: usize,
}

impl Picklist {
    pub fn new(
        name: impl Into<String>,
        services: Services,
        choices: impl Choices + 'static,
    ) -> Self {
        let per_row = services.config.max_buttons_per_row;
        Self {
            common: Common::new(name, services),
            choices: Box::new(choices),
            remove_buttons: AtomicBool::new(false),
            no_update: false,
            choose_hint: false,
            back: None,
            pattern: Vec::new(),
            per_row,
        }
    }

    /// Drop the keyboard once a choice is made.
    pub fn with_remove_buttons(self, remove: bool) -> Self {
        self.remove_buttons.store(remove, Ordering::Relaxed);
        self
    }

    /// Leave the message untouched once a choice is made.
    pub fn with_no_update(mut self, no_update: bool) -> Self {
        self.no_update = no_update;
        self
    }

    pub fn with_overwrite(self, overwrite: bool) -> Self {
        self.common.set_overwrite(overwrite);
        self
    }

    /// Append the "choose a value" hint when the message is re-rendered.
    pub fn with_choose_hint(mut self, hint: bool) -> Self {
        self.choose_hint = hint;
        self
    }

    pub fn private_only(mut self, private_only: bool) -> Self {
        self.common.private_only = private_only;
        self
    }

    /// Add a button returning to the previous control.
    pub fn with_back_button(mut self, label: impl Texter + 'static) -> Self {
        self.back = Some(Box::new(label));
        self
    }

    /// Lay buttons out by row pattern, each entry is a row's button count.
    pub fn with_pattern(mut self, pattern: Vec<usize>) -> Result<Self, ConfigError> {
        validate_pattern(&pattern)?;
        self.pattern = pattern;
        Ok(self)
    }

    pub fn with_buttons_per_row(mut self, per_row: usize) -> Self {
        self.per_row = clamp_per_row(per_row);
        self
    }

    pub fn with_fallback_lang(mut self, lang: &str) -> Result<Self, ConfigError> {
        self.common.set_fallback_lang(lang)?;
        Ok(self)
    }

    pub fn with_send_options(mut self, options: SendOptions) -> Self {
        self.common.send_options = options;
        self
    }

    async fn back_label(&self, call: &Call<'_>) -> Option<String> {
        let back = self.back.as_ref()?;
        match back.text(call).await {
            Ok(label) => Some(label),
            Err(e) => {
                tracing::warn!(
                    control = %self.common.name(),
                    error = %e,
                    "Back button label failed"
                );
                None
            }
        }
    }

    async fn keyboard(
        &self,
        call: &Call<'_>,
        values: Vec<String>,
    ) -> Result<InlineKeyboard, ControlError> {
        let name = self.common.name();
        let button = |label: String| InlineButton {
            action: action_token(name, &label),
            data: label.clone(),
            label,
        };
        let mut buttons: Vec<InlineButton> = values.into_iter().map(button).collect();
        let back = self.back_label(call).await.map(button);

        let rows = if self.pattern.is_empty() {
            let mut rows = pack_even(buttons, self.per_row);
            rows.extend(back.map(|b| vec![b]));
            rows
        } else {
            let mut pattern = self.pattern.clone();
            if let Some(b) = back {
                buttons.push(b);
                pattern.push(1);
            }
            pack_pattern(buttons, &pattern)?
        };
        Ok(InlineKeyboard::new(rows))
    }

    async fn values(&self, call: &Call<'_>) -> Result<Vec<String>, ControlError> {
        match self.choices.values(call).await {
            Ok(values) => Ok(values),
            Err(e) => {
                tracing::error!(
                    control = %self.common.name(),
                    error = %e,
                    "Failed to resolve values"
                );
                if !self.choices.on_error(call, &e).await {
                    self.common.send_unexpected(call.event).await;
                }
                Err(ControlError::values(self.common.name(), e))
            }
        }
    }

    fn format(&self, call: &Call<'_>, text: String) -> String {
        if self.choose_hint {
            format!("{text}\n\n{}", call.tr(MSG_CHOOSE_VAL))
        } else {
            text
        }
    }

    /// Updates the message after a choice.
    async fn rerender(&self, call: &Call<'_>, message: MessageRef) -> Result<(), ControlError> {
        let name = self.common.name();
        let text = self
            .choices
            .text(call)
            .await
            .map_err(|e| ControlError::text(name, e))?;

        let options = if self.remove_buttons.load(Ordering::Relaxed) {
            self.common.send_options.without_keyboard()
        } else if self.no_update {
            return Ok(());
        } else {
            let values = self.values(call).await?;
            let keyboard = self.keyboard(call, values).await?;
            self.register_actions(call.step, &keyboard);
            self.common.send_options.with_keyboard(keyboard)
        };
        let text = if options.keyboard.is_some() {
            self.format(call, text)
        } else {
            text
        };
        match self.common.channel().edit(message, &text, &options).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_modified() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn register_actions(&self, step: &Step, keyboard: &InlineKeyboard) {
        let handler = step.action_handler();
        for button in keyboard.buttons() {
            self.common
                .channel()
                .register_action(&button.action, handler.clone());
        }
    }

    async fn respond(&self, press: &ActionPress, response: ActionResponse) {
        if let Err(e) = self.common.channel().respond(press, response).await {
            tracing::warn!(
                control = %self.common.name(),
                error = %e,
                "Failed to answer button press"
            );
        }
    }

    async fn go_back(
        &self,
        step: &Step,
        event: &Event,
        press: &ActionPress,
    ) -> Result<(), ControlError> {
        tracing::debug!(control = %self.common.name(), "Back pressed");
        self.respond(press, ActionResponse::empty()).await;
        step.handle_prev(event).await
    }
}

#[async_trait]
impl Controller for Picklist {
    fn name(&self) -> &str {
        self.common.name()
    }

    async fn handle(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        if self.common.skips(event) {
            return Ok(());
        }
        let call = self.common.call(step, event);
        let values = self.values(&call).await?;
        let text = match self.choices.text(&call).await {
            Ok(text) => text,
            Err(e) => {
                self.common.send_unexpected(event).await;
                return Err(ControlError::text(self.common.name(), e));
            }
        };
        let keyboard = self.keyboard(&call, values).await?;
        self.register_actions(step, &keyboard);

        let options = self.common.send_options.with_keyboard(keyboard);
        let message = self.common.send_or_edit(step, event, &text, &options).await?;
        self.common.register(event, message);
        Ok(())
    }

    async fn on_action(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        let Some(press) = event.press() else {
            return Ok(());
        };
        self.common.log_callback(event, press);
        let call = self.common.call(step, event);

        if self
            .back_label(&call)
            .await
            .is_some_and(|label| label == press.data)
        {
            return self.go_back(step, event, press).await;
        }

        let recipient = event.recipient();
        let outcome = self.choices.choose(&call, &press.data).await;
        tracing::debug!(
            control = %self.common.name(),
            outcome = outcome.kind(),
            "Choice validated"
        );
        let response = match outcome {
            Outcome::Back => return self.go_back(step, event, press).await,
            Outcome::NoChange => {
                self.respond(press, ActionResponse::empty()).await;
                return Ok(());
            }
            Outcome::Retry(notice) => {
                let response = ActionResponse {
                    text: Some(notice.text),
                    show_alert: notice.alert,
                };
                self.respond(press, response).await;
                return Ok(());
            }
            Outcome::Fatal(err) => {
                tracing::error!(
                    control = %self.common.name(),
                    error = %err,
                    "Choice callback failed"
                );
                if let Err(e) = self.rerender(&call, press.message).await {
                    tracing::warn!(
                        control = %self.common.name(),
                        error = %e,
                        "Failed to update message"
                    );
                }
                self.respond(press, ActionResponse::alert(call.tr(MSG_UNEXPECTED)))
                    .await;
                self.common
                    .registry()
                    .unregister_outgoing(&recipient, press.message.id);
                return Err(ControlError::callback(self.common.name(), err));
            }
            Outcome::Notice(notice) => ActionResponse {
                text: Some(notice.text),
                show_alert: notice.alert,
            },
            Outcome::Accept => ActionResponse::text(call.tr(MSG_OK)),
        };

        self.common
            .registry()
            .set_value(&recipient, press.data.clone());
        if let Err(e) = self.rerender(&call, press.message).await {
            tracing::warn!(control = %self.common.name(), error = %e, "Failed to update message");
        }
        self.respond(press, response).await;

        let result = step.handle_next(event).await;
        self.common
            .registry()
            .unregister_outgoing(&recipient, press.message.id);
        result
    }

    fn value(&self, recipient: &str) -> Option<String> {
        self.common.registry().value(recipient)
    }

    fn outgoing_message_id(&self, recipient: &str) -> Option<MessageId> {
        self.common.registry().last_outgoing_id(recipient)
    }

    fn set_overwrite(&self, overwrite: bool) {
        self.common.set_overwrite(overwrite);
    }

    fn set_remove_buttons(&self, remove: bool) {
        self.remove_buttons.store(remove, Ordering::Relaxed);
    }
}
