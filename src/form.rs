//! Forms: ordered chains of controllers
//!
//! A [`Form`] links its controllers in insertion order. The first controller
//! is rendered by [`Form::handle`]; each controller then hands the
//! interaction to its neighbours through the [`Step`] it is invoked with.

use crate::channel::Event;
use crate::controller::{Controller, Step};
use crate::error::{ControlError, FormError};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// Handler for text messages no control is waiting for
pub type TextHandler =
    Arc<dyn Fn(Event) -> BoxFuture<'static, Result<(), ControlError>> + Send + Sync>;

/// Ordered, navigable set of uniquely named controllers
pub struct Form {
    controllers: Vec<Arc<dyn Controller>>,
    by_name: HashMap<String, usize>,
    me: Weak<Form>,
}

impl Form {
    pub fn new(controllers: Vec<Arc<dyn Controller>>) -> Result<Arc<Self>, FormError> {
        if controllers.is_empty() {
            return Err(FormError::Empty);
        }
        let mut by_name = HashMap::with_capacity(controllers.len());
        for (index, ctrl) in controllers.iter().enumerate() {
            if by_name.insert(ctrl.name().to_string(), index).is_some() {
                return Err(FormError::DuplicateName(ctrl.name().to_string()));
            }
        }
        Ok(Arc::new_cyclic(|me| Self {
            controllers,
            by_name,
            me: me.clone(),
        }))
    }

    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    pub fn step(&self, index: usize) -> Step {
        Step::new(self.me.clone(), index)
    }

    pub(crate) fn controller_at(&self, index: usize) -> Option<Arc<dyn Controller>> {
        self.controllers.get(index).cloned()
    }

    pub fn controller(&self, name: &str) -> Option<Arc<dyn Controller>> {
        self.by_name
            .get(name)
            .and_then(|&index| self.controller_at(index))
    }

    /// Controller following `name`, `None` for the last one.
    pub fn next(&self, name: &str) -> Option<Arc<dyn Controller>> {
        let index = *self.by_name.get(name)?;
        self.controller_at(index + 1)
    }

    /// Controller preceding `name`, `None` for the first one.
    pub fn prev(&self, name: &str) -> Option<Arc<dyn Controller>> {
        let index = self.by_name.get(name)?.checked_sub(1)?;
        self.controller_at(index)
    }

    /// Starts the form by rendering its first controller.
    pub async fn handle(&self, event: &Event) -> Result<(), ControlError> {
        tracing::debug!(sender = %event.sender, chat = %event.chat, "Starting form");
        let step = self.step(0);
        self.controllers[0].handle(&step, event).await
    }

    pub fn set_overwrite(&self, overwrite: bool) {
        for ctrl in &self.controllers {
            ctrl.set_overwrite(overwrite);
        }
    }

    pub fn set_remove_buttons(&self, remove: bool) {
        for ctrl in &self.controllers {
            ctrl.set_remove_buttons(remove);
        }
    }

    /// Values entered by the recipient so far, keyed by controller name.
    pub fn data(&self, recipient: &str) -> HashMap<String, String> {
        self.controllers
            .iter()
            .filter_map(|ctrl| Some((ctrl.name().to_string(), ctrl.value(recipient)?)))
            .collect()
    }

    pub fn value(&self, name: &str, recipient: &str) -> Option<String> {
        self.controller(name)?.value(recipient)
    }

    /// Builds the handler for incoming text messages. Text goes to the first
    /// controller waiting on the sender, otherwise to `fallback`.
    pub fn text_middleware(self: &Arc<Self>, fallback: Option<TextHandler>) -> TextMiddleware {
        let inputs = self
            .controllers
            .iter()
            .enumerate()
            .filter(|(_, ctrl)| ctrl.text_input().is_some())
            .map(|(index, _)| index)
            .collect();
        TextMiddleware {
            form: Arc::clone(self),
            inputs,
            fallback,
        }
    }
}

impl std::fmt::Debug for Form {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.controllers.iter().map(|c| c.name()).collect();
        f.debug_struct("Form").field("controllers", &names).finish()
    }
}

/// Dispatcher for text messages, bound to the channel's text event
pub struct TextMiddleware {
    form: Arc<Form>,
    inputs: Vec<usize>,
    fallback: Option<TextHandler>,
}

impl TextMiddleware {
    pub async fn handle(&self, event: Event) -> Result<(), ControlError> {
        let recipient = event.recipient();
        for &index in &self.inputs {
            let Some(ctrl) = self.form.controller_at(index) else {
                continue;
            };
            let Some(input) = ctrl.text_input() else {
                continue;
            };
            if input.is_waiting(&recipient) {
                return input.on_text(&self.form.step(index), &event).await;
            }
        }
        match &self.fallback {
            Some(fallback) => fallback(event).await,
            None => Ok(()),
        }
    }
}
