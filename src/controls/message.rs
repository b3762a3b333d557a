//! Plain message step
//!
//! Sends its text, or edits the previous control's message in overwrite
//! mode, then hands the interaction to the next control.

use crate::channel::{Event, MessageId, SendOptions};
use crate::config::Services;
use crate::controller::{Common, Controller, Step, Texter};
use crate::error::ControlError;
use async_trait::async_trait;

/// Sends a message and moves on, e.g. a confirmation at the end of a form.
pub struct Message {
    common: Common,
    text: Box<dyn Texter>,
}

impl Message {
    pub fn new(name: impl Into<String>, services: Services, text: impl Texter + 'static) -> Self {
        Self {
            common: Common::new(name, services),
            text: Box::new(text),
        }
    }

    pub fn with_send_options(mut self, options: SendOptions) -> Self {
        self.common.send_options = options;
        self
    }

    pub fn with_overwrite(self, overwrite: bool) -> Self {
        self.common.set_overwrite(overwrite);
        self
    }
}

#[async_trait]
impl Controller for Message {
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
        let message = self
            .common
            .send_or_edit(step, event, &text, &self.common.send_options)
            .await?;
        self.common.register(event, message);
        self.common
            .registry()
            .unregister_outgoing(&event.recipient(), message.id);
        step.handle_next(event).await
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::{command_event, MockChannel, Probe};
    use crate::channel::ChannelError;
    use crate::controller::{Call, TextFn};
    use crate::error::BoxError;
    use crate::form::Form;
    use crate::i18n::Catalog;
    use std::sync::Arc;

    fn form(
        channel: &Arc<MockChannel>,
        message: impl FnOnce(Services) -> Message,
    ) -> (Arc<Form>, Arc<Probe>, Arc<Probe>) {
        let services = Services::new(channel.clone(), Arc::new(Catalog::builtin()));
        let prev = Arc::new(Probe::new("prev"));
        let next = Arc::new(Probe::new("next"));
        let form = Form::new(vec![
            prev.clone() as Arc<dyn Controller>,
            Arc::new(message(services)),
            next.clone(),
        ])
        .unwrap();
        (form, prev, next)
    }

    async fn render(form: &Form) -> Result<(), ControlError> {
        let step = form.step(1);
        step.controller()?
            .handle(&step, &command_event(1, 1, "/go"))
            .await
    }

    #[tokio::test]
    async fn test_sends_and_advances() {
        let channel = Arc::new(MockChannel::new());
        let (form, _, next) = form(&channel, |s| Message::new("thanks", s, "Thank you!"));
        render(&form).await.unwrap();

        let sent = channel.last_sent();
        assert_eq!(sent.text, "Thank you!");
        assert_eq!(next.handled(), 1);
        let ctrl = form.controller("thanks").unwrap();
        assert_eq!(ctrl.outgoing_message_id("1"), Some(sent.message.id));
        assert_eq!(ctrl.value("1"), None);
    }

    #[tokio::test]
    async fn test_overwrite_edits_previous() {
        let channel = Arc::new(MockChannel::new());
        let (form, prev, _) = form(&channel, |s| {
            Message::new("thanks", s, "Thank you!").with_overwrite(true)
        });
        prev.set_outgoing("1", MessageId(42));
        render(&form).await.unwrap();

        assert!(channel.sent().is_empty());
        let edit = channel.edits().pop().unwrap();
        assert_eq!(edit.message.id, MessageId(42));
        assert_eq!(edit.text.as_deref(), Some("Thank you!"));
    }

    #[tokio::test]
    async fn test_overwrite_without_previous_message_sends() {
        let channel = Arc::new(MockChannel::new());
        let (form, _, _) = form(&channel, |s| {
            Message::new("thanks", s, "Thank you!").with_overwrite(true)
        });
        render(&form).await.unwrap();
        assert_eq!(channel.sent_texts(), vec!["Thank you!"]);
    }

    #[tokio::test]
    async fn test_text_error() {
        let channel = Arc::new(MockChannel::new());
        let (form, _, next) = form(&channel, |s| {
            Message::new(
                "thanks",
                s,
                TextFn(|_: &Call<'_>| -> Result<String, BoxError> { Err("no template".into()) }),
            )
        });
        let err = render(&form).await.unwrap_err();
        assert!(matches!(err, ControlError::Text { .. }));
        assert_eq!(next.handled(), 0);
        assert!(channel.sent().is_empty());
    }

    #[tokio::test]
    async fn test_send_error() {
        let channel = Arc::new(MockChannel::new());
        let (form, _, next) = form(&channel, |s| Message::new("thanks", s, "Thank you!"));
        channel.queue_send_error(ChannelError::rate_limited("retry after 3"));
        let err = render(&form).await.unwrap_err();
        assert!(matches!(err, ControlError::Channel(_)));
        assert_eq!(next.handled(), 0);
    }
}
