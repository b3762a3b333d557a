//! Free-text prompt
//!
//! The control sends a prompt and waits for the sender's reply, which the
//! form's text middleware routes back to it. A rejected reply is answered
//! with the validator's notice and the prompt is repeated after the
//! configured retry delay. Prompts are always sent as new messages, overwrite
//! mode does not apply to inputs.

use crate::channel::{Event, MessageId, SendOptions};
use crate::config::Services;
use crate::controller::{Call, Common, Controller, Step, TextInput, TextValidator, Texter};
use crate::error::{ConfigError, ControlError};
use crate::outcome::Outcome;
use async_trait::async_trait;

pub struct Input {
    common: Common,
    prompt: Box<dyn Texter>,
    validator: Box<dyn TextValidator>,
    no_reply: bool,
}

impl Input {
    /// Creates an input accepting any reply.
    pub fn new(name: impl Into<String>, services: Services, prompt: impl Texter + 'static) -> Self {
        Self {
            common: Common::new(name, services),
            prompt: Box::new(prompt),
            validator: Box::new(|_: &Call<'_>, _: &str| Outcome::Accept),
            no_reply: false,
        }
    }

    pub fn with_validator(mut self, validator: impl TextValidator + 'static) -> Self {
        self.validator = Box::new(validator);
        self
    }

    /// Send the prompt as a plain message instead of a forced reply.
    pub fn with_no_reply(mut self, no_reply: bool) -> Self {
        self.no_reply = no_reply;
        self
    }

    pub fn private_only(mut self, private_only: bool) -> Self {
        self.common.private_only = private_only;
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

    /// Stops waiting on the recipient and forgets the prompt.
    fn finish(&self, recipient: &str) {
        let registry = self.common.registry();
        if let Some(prompt) = registry.end_wait(recipient) {
            registry.unregister_outgoing(recipient, prompt);
        }
    }

    async fn retry(&self, step: &Step, event: &Event, notice: &str) -> Result<(), ControlError> {
        let channel = self.common.channel();
        channel
            .send(event.chat.id, notice, &SendOptions::default())
            .await?;
        if let Err(e) = channel.notify_typing(event.chat.id).await {
            tracing::warn!(
                control = %self.common.name(),
                error = %e,
                "Failed to send typing notification"
            );
        }
        self.finish(&event.recipient());

        let step = step.clone();
        let event = event.clone();
        let delay = self.common.services().config.retry_delay;
        let name = self.common.name().to_string();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let result = match step.controller() {
                Ok(ctrl) => ctrl.handle(&step, &event).await,
                Err(e) => Err(e),
            };
            if let Err(e) = result {
                tracing::error!(control = %name, error = %e, "Failed to repeat prompt");
            }
        });
        Ok(())
    }
}

#[async_trait]
impl Controller for Input {
    fn name(&self) -> &str {
        self.common.name()
    }

    async fn handle(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        if self.common.skips(event) {
            return Ok(());
        }
        let call = self.common.call(step, event);
        let text = match self.prompt.text(&call).await {
            Ok(text) => text,
            Err(e) => {
                self.common.send_unexpected(event).await;
                return Err(ControlError::text(self.common.name(), e));
            }
        };
        let options = SendOptions {
            force_reply: !self.no_reply,
            ..self.common.send_options.clone()
        };
        let message = self
            .common
            .channel()
            .send(event.chat.id, &text, &options)
            .await?;
        self.common
            .registry()
            .begin_wait(&event.recipient(), message.id);
        self.common.register(event, message);
        Ok(())
    }

    fn value(&self, recipient: &str) -> Option<String> {
        self.common.registry().value(recipient)
    }

    fn outgoing_message_id(&self, recipient: &str) -> Option<MessageId> {
        self.common.registry().last_outgoing_id(recipient)
    }

    fn text_input(&self) -> Option<&dyn TextInput> {
        Some(self)
    }
}

#[async_trait]
impl TextInput for Input {
    fn is_waiting(&self, recipient: &str) -> bool {
        self.common.registry().is_waiting(recipient)
    }

    async fn on_text(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        let Some(message) = event.message() else {
            return Ok(());
        };
        let recipient = event.recipient();
        self.common
            .log_text_reply(event, self.common.registry().waiting_message_id(&recipient));

        let call = self.common.call(step, event);
        let outcome = self.validator.validate(&call, &message.text).await;
        tracing::debug!(control = %self.common.name(), outcome = outcome.kind(), "Reply validated");
        match outcome {
            Outcome::NoChange => return Ok(()),
            Outcome::Retry(notice) => return self.retry(step, event, &notice.text).await,
            Outcome::Fatal(err) => {
                tracing::error!(
                    control = %self.common.name(),
                    error = %err,
                    "Reply validation failed"
                );
                self.common.send_unexpected(event).await;
                self.finish(&recipient);
                return Err(ControlError::callback(self.common.name(), err));
            }
            Outcome::Back => {
                self.finish(&recipient);
                return step.handle_prev(event).await;
            }
            Outcome::Notice(notice) => {
                self.common
                    .channel()
                    .send(event.chat.id, &notice.text, &SendOptions::default())
                    .await?;
            }
            Outcome::Accept => {}
        }

        self.common
            .registry()
            .set_value(&recipient, message.text.clone());
        self.finish(&recipient);
        step.handle_next(event).await
    }
}
