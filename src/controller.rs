//! The controller abstraction shared by every control
//!
//! A [`Controller`] is one interactive step of a [`Form`]. Every call receives
//! a [`Step`], the controller's position in its form, which resolves the
//! neighbouring controllers for forward and back navigation.

use crate::channel::{
    ActionHandler, ActionPress, Channel, Event, MessageId, MessageRef, SendOptions,
};
use crate::config::{validate_language, Services};
use crate::error::{BoxError, ConfigError, ControlError};
use crate::form::Form;
use crate::i18n::MSG_UNEXPECTED;
use crate::outcome::Outcome;
use crate::registry::Registry;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use uuid::Uuid;

/// A single interactive step of a form
#[async_trait]
pub trait Controller: Send + Sync {
    /// Unique name within the form
    fn name(&self) -> &str;

    /// Render the control for the event's sender.
    async fn handle(&self, step: &Step, event: &Event) -> Result<(), ControlError>;

    /// Button press on a message rendered by this control.
    async fn on_action(&self, _step: &Step, _event: &Event) -> Result<(), ControlError> {
        Ok(())
    }

    /// Value stored for the recipient, if any
    fn value(&self, recipient: &str) -> Option<String>;

    /// Last message this control sent to the recipient
    fn outgoing_message_id(&self, recipient: &str) -> Option<MessageId>;

    /// Free-text handling, for controls that read replies.
    fn text_input(&self) -> Option<&dyn TextInput> {
        None
    }

    /// Edit the previous control's message instead of sending a new one.
    fn set_overwrite(&self, _overwrite: bool) {}

    /// Drop the keyboard once a choice has been made.
    fn set_remove_buttons(&self, _remove: bool) {}
}

/// Controls that consume free-text replies
#[async_trait]
pub trait TextInput: Send + Sync {
    fn is_waiting(&self, recipient: &str) -> bool;

    /// Handle a text reply from a recipient this control is waiting on.
    async fn on_text(&self, step: &Step, event: &Event) -> Result<(), ControlError>;
}

/// Position of a controller within its form
#[derive(Clone)]
pub struct Step {
    form: Weak<Form>,
    index: usize,
}

impl Step {
    pub(crate) fn new(form: Weak<Form>, index: usize) -> Self {
        Self { form, index }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn form(&self) -> Result<Arc<Form>, ControlError> {
        self.form.upgrade().ok_or(ControlError::FormDropped)
    }

    pub fn controller(&self) -> Result<Arc<dyn Controller>, ControlError> {
        self.form()?
            .controller_at(self.index)
            .ok_or(ControlError::FormDropped)
    }

    pub fn prev(&self) -> Option<Step> {
        let index = self.index.checked_sub(1)?;
        Some(Self::new(self.form.clone(), index))
    }

    pub fn next(&self) -> Result<Option<Step>, ControlError> {
        let len = self.form()?.len();
        let index = self.index + 1;
        Ok((index < len).then(|| Self::new(self.form.clone(), index)))
    }

    pub fn prev_controller(&self) -> Result<Option<Arc<dyn Controller>>, ControlError> {
        match self.prev() {
            Some(step) => step.controller().map(Some),
            None => Ok(None),
        }
    }

    pub fn next_controller(&self) -> Result<Option<Arc<dyn Controller>>, ControlError> {
        match self.next()? {
            Some(step) => step.controller().map(Some),
            None => Ok(None),
        }
    }

    /// Hand the interaction to the next controller, if there is one.
    pub async fn handle_next(&self, event: &Event) -> Result<(), ControlError> {
        match self.next()? {
            Some(next) => next.controller()?.handle(&next, event).await,
            None => Ok(()),
        }
    }

    /// Hand the interaction back to the previous controller, if there is one.
    pub async fn handle_prev(&self, event: &Event) -> Result<(), ControlError> {
        match self.prev() {
            Some(prev) => prev.controller()?.handle(&prev, event).await,
            None => Ok(()),
        }
    }

    /// Handler routing button presses to this step's controller.
    pub fn action_handler(&self) -> Arc<dyn ActionHandler> {
        Arc::new(StepAction { step: self.clone() })
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("index", &self.index).finish()
    }
}

struct StepAction {
    step: Step,
}

#[async_trait]
impl ActionHandler for StepAction {
    async fn on_action(&self, event: Event) -> Result<(), ControlError> {
        let controller = self.step.controller()?;
        controller.on_action(&self.step, &event).await
    }
}

/// Context handed to caller-supplied callbacks
pub struct Call<'a> {
    pub step: &'a Step,
    pub event: &'a Event,
    pub services: &'a Services,
    /// Name of the control running the callback
    pub control: &'a str,
}

impl Call<'_> {
    pub fn recipient(&self) -> String {
        self.event.recipient()
    }

    /// Language of the sender, or the configured fallback.
    pub fn language(&self) -> &str {
        self.event
            .language()
            .unwrap_or(&self.services.config.fallback_lang)
    }

    /// Translate `key` for the sender.
    pub fn tr(&self, key: &str) -> String {
        self.services.translator.resolve(
            self.language(),
            key,
            &self.services.config.fallback_lang,
        )
    }

    /// Values collected so far by the form for this sender.
    pub fn form_data(&self) -> HashMap<String, String> {
        self.step
            .form()
            .map(|form| form.data(&self.event.recipient()))
            .unwrap_or_default()
    }
}

/// Source of a control's message text
#[async_trait]
pub trait Texter: Send + Sync {
    async fn text(&self, call: &Call<'_>) -> Result<String, BoxError>;
}

#[async_trait]
impl Texter for String {
    async fn text(&self, _call: &Call<'_>) -> Result<String, BoxError> {
        Ok(self.clone())
    }
}

#[async_trait]
impl Texter for &'static str {
    async fn text(&self, _call: &Call<'_>) -> Result<String, BoxError> {
        Ok((*self).to_string())
    }
}

/// Texter computing the text with a closure.
pub struct TextFn<F>(pub F);

#[async_trait]
impl<F> Texter for TextFn<F>
where
    F: for<'a> Fn(&Call<'a>) -> Result<String, BoxError> + Send + Sync,
{
    async fn text(&self, call: &Call<'_>) -> Result<String, BoxError> {
        (self.0)(call)
    }
}

/// Validator for free-text replies
#[async_trait]
pub trait TextValidator: Send + Sync {
    async fn validate(&self, call: &Call<'_>, text: &str) -> Outcome;
}

#[async_trait]
impl<F> TextValidator for F
where
    F: for<'a, 'b> Fn(&Call<'a>, &'b str) -> Outcome + Send + Sync,
{
    async fn validate(&self, call: &Call<'_>, text: &str) -> Outcome {
        self(call, text)
    }
}

/// State and helpers shared by the built-in controls
pub struct Common {
    name: String,
    services: Services,
    registry: Registry,
    overwrite: AtomicBool,
    pub(crate) private_only: bool,
    pub(crate) send_options: SendOptions,
}

impl Common {
    pub fn new(name: impl Into<String>, services: Services) -> Self {
        Self {
            name: name.into(),
            services,
            registry: Registry::new(),
            overwrite: AtomicBool::new(false),
            private_only: false,
            send_options: SendOptions::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    pub fn channel(&self) -> &dyn Channel {
        self.services.channel.as_ref()
    }

    /// Overrides the fallback language for this control only.
    pub fn set_fallback_lang(&mut self, lang: &str) -> Result<(), ConfigError> {
        validate_language(lang)?;
        self.services.config.fallback_lang = lang.to_string();
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite.load(Ordering::Relaxed)
    }

    pub fn set_overwrite(&self, overwrite: bool) {
        self.overwrite.store(overwrite, Ordering::Relaxed);
    }

    pub fn call<'a>(&'a self, step: &'a Step, event: &'a Event) -> Call<'a> {
        Call {
            step,
            event,
            services: &self.services,
            control: &self.name,
        }
    }

    /// Controls restricted to private chats ignore everything else.
    pub fn skips(&self, event: &Event) -> bool {
        if self.private_only && !event.is_private() {
            tracing::debug!(control = %self.name, chat = %event.chat, "Ignoring non-private chat");
            return true;
        }
        false
    }

    /// Translate `key` for the event's sender.
    pub fn tr(&self, event: &Event, key: &str) -> String {
        let fallback = &self.services.config.fallback_lang;
        let lang = event.language().unwrap_or(fallback);
        self.services.translator.resolve(lang, key, fallback)
    }

    /// Sends `text`, or edits the previous control's message when overwrite
    /// mode is on and that message is known.
    pub async fn send_or_edit(
        &self,
        step: &Step,
        event: &Event,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ControlError> {
        if self.overwrite() {
            let previous = step
                .prev_controller()?
                .and_then(|prev| prev.outgoing_message_id(&event.recipient()));
            if let Some(id) = previous {
                match self
                    .channel()
                    .edit(MessageRef::new(event.chat.id, id), text, options)
                    .await
                {
                    Ok(msg) => return Ok(msg),
                    Err(e) => {
                        tracing::warn!(
                            control = %self.name,
                            error = %e,
                            message_id = %id,
                            "Failed to edit previous message, sending a new one"
                        );
                    }
                }
            }
        }
        Ok(self.channel().send(event.chat.id, text, options).await?)
    }

    /// Tell the user something went wrong. Failures are logged only, the
    /// caller is already reporting an error.
    pub async fn send_unexpected(&self, event: &Event) {
        let text = self.tr(event, MSG_UNEXPECTED);
        if let Err(e) = self
            .channel()
            .send(event.chat.id, &text, &SendOptions::default())
            .await
        {
            tracing::error!(control = %self.name, error = %e, "Failed to report unexpected error");
        }
    }

    /// Records an outgoing message and logs it.
    pub fn register(&self, event: &Event, message: MessageRef) -> Uuid {
        let correlation_id = self.registry.register_outgoing(&event.recipient(), message.id);
        tracing::info!(
            control = %self.name,
            correlation_id = %correlation_id,
            sender = %event.sender,
            chat = %event.chat,
            message_id = %message.id,
            "Message sent"
        );
        tracing::debug!(control = %self.name, event = %event.dump(), "Triggering event");
        correlation_id
    }

    pub fn log_callback(&self, event: &Event, press: &ActionPress) {
        let info = self
            .registry
            .correlation_info(&event.recipient(), press.message.id);
        tracing::info!(
            control = %self.name,
            correlation_id = %info,
            elapsed_ms = info.elapsed_ms(),
            sender = %event.sender,
            chat = %event.chat,
            data = %press.data,
            "Callback received"
        );
        tracing::debug!(control = %self.name, event = %event.dump(), "Callback event");
    }

    pub fn log_text_reply(&self, event: &Event, prompt: Option<MessageId>) {
        let info = prompt.map(|id| self.registry.correlation_info(&event.recipient(), id));
        tracing::info!(
            control = %self.name,
            correlation_id = info.as_ref().map_or("[unknown]", |i| i.id.as_str()),
            elapsed_ms = info.as_ref().and_then(|i| i.elapsed_ms()),
            sender = %event.sender,
            chat = %event.chat,
            "Text reply received"
        );
        tracing::debug!(control = %self.name, event = %event.dump(), "Text event");
    }
}
