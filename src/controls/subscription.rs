//! Group subscription check
//!
//! A picklist with a single "Check subscription" button. The form advances
//! only once the user is a member of every configured group.

use super::picklist::{Choices, Picklist};
use crate::channel::{Event, MessageId};
use crate::config::Services;
use crate::controller::{Call, Controller, Step, Texter};
use crate::error::{BoxError, ConfigError, ControlError};
use crate::i18n::{MSG_SUB_CHECK, MSG_SUB_NO_SUB};
use crate::outcome::Outcome;
use async_trait::async_trait;

struct MembershipChoices {
    text: Box<dyn Texter>,
    groups: Vec<String>,
}

#[async_trait]
impl Choices for MembershipChoices {
    async fn text(&self, call: &Call<'_>) -> Result<String, BoxError> {
        self.text.text(call).await
    }

    async fn values(&self, call: &Call<'_>) -> Result<Vec<String>, BoxError> {
        Ok(vec![call.tr(MSG_SUB_CHECK)])
    }

    async fn choose(&self, call: &Call<'_>, _value: &str) -> Outcome {
        let sender = &call.event.sender;
        let mut subscribed = 0;
        for group in &self.groups {
            match call.services.channel.resolve_membership(group, sender).await {
                Ok(role) => {
                    tracing::debug!(
                        control = %call.control,
                        %sender,
                        group = %group,
                        ?role,
                        "Resolved membership"
                    );
                    if role.is_member() {
                        subscribed += 1;
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        control = %call.control,
                        group = %group,
                        error = %e,
                        "Failed to resolve membership"
                    );
                }
            }
        }
        if subscribed == self.groups.len() {
            Outcome::Accept
        } else {
            Outcome::retry(call.tr(MSG_SUB_NO_SUB))
        }
    }
}

pub struct SubscriptionCheck {
    picklist: Picklist,
}

impl SubscriptionCheck {
    /// Checks membership in `groups`, given as channel-specific group ids.
    pub fn new(
        name: impl Into<String>,
        services: Services,
        text: impl Texter + 'static,
        groups: Vec<String>,
    ) -> Self {
        let choices = MembershipChoices {
            text: Box::new(text),
            groups,
        };
        Self {
            picklist: Picklist::new(name, services, choices).with_remove_buttons(true),
        }
    }

    pub fn private_only(mut self, private_only: bool) -> Self {
        self.picklist = self.picklist.private_only(private_only);
        self
    }

    pub fn with_fallback_lang(mut self, lang: &str) -> Result<Self, ConfigError> {
        self.picklist = self.picklist.with_fallback_lang(lang)?;
        Ok(self)
    }
}

#[async_trait]
impl Controller for SubscriptionCheck {
    fn name(&self) -> &str {
        self.picklist.name()
    }

    async fn handle(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        self.picklist.handle(step, event).await
    }

    async fn on_action(&self, step: &Step, event: &Event) -> Result<(), ControlError> {
        self.picklist.on_action(step, event).await
    }

    fn value(&self, recipient: &str) -> Option<String> {
        self.picklist.value(recipient)
    }

    fn outgoing_message_id(&self, recipient: &str) -> Option<MessageId> {
        self.picklist.outgoing_message_id(recipient)
    }

    fn set_overwrite(&self, overwrite: bool) {
        self.picklist.set_overwrite(overwrite);
    }
}
