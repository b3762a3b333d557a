//! Mock implementations for testing
//!
//! These mocks let controls and forms run without a real chat platform.

use super::traits::*;
use super::types::*;
use super::ChannelError;
use crate::controller::{Controller, Step};
use crate::error::ControlError;
use crate::registry::Registry;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fixtures
// ============================================================================

pub fn user(id: i64) -> Sender {
    Sender::new(id).with_username(format!("user{id}"))
}

pub fn private_chat(id: i64) -> Chat {
    Chat::private(id)
}

pub fn command_event(sender: i64, chat: i64, text: &str) -> Event {
    Event::command(user(sender), private_chat(chat), text)
}

pub fn text_event(sender: i64, chat: i64, text: &str) -> Event {
    Event::text(user(sender), private_chat(chat), MessageId(0), text)
}

// ============================================================================
// Mock Channel
// ============================================================================

#[derive(Debug, Clone)]
pub struct SentMessage {
    pub message: MessageRef,
    pub text: String,
    pub options: SendOptions,
}

#[derive(Debug, Clone)]
pub struct EditedMessage {
    pub message: MessageRef,
    /// `None` for keyboard-only edits
    pub text: Option<String>,
    pub keyboard: Option<InlineKeyboard>,
}

/// Channel recording everything controls do with it
pub struct MockChannel {
    next_id: AtomicI64,
    next_press: AtomicUsize,
    pub sent: Mutex<Vec<SentMessage>>,
    pub edits: Mutex<Vec<EditedMessage>>,
    pub responses: Mutex<Vec<(ActionPress, ActionResponse)>>,
    pub typing: Mutex<Vec<ChatId>>,
    handlers: Mutex<HashMap<String, Arc<dyn ActionHandler>>>,
    keyboards: Mutex<HashMap<MessageRef, InlineKeyboard>>,
    memberships: Mutex<HashMap<(String, i64), MemberRole>>,
    broken_groups: Mutex<HashSet<String>>,
    send_errors: Mutex<VecDeque<ChannelError>>,
    edit_errors: Mutex<VecDeque<ChannelError>>,
}

impl Default for MockChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChannel {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(100),
            next_press: AtomicUsize::new(0),
            sent: Mutex::new(Vec::new()),
            edits: Mutex::new(Vec::new()),
            responses: Mutex::new(Vec::new()),
            typing: Mutex::new(Vec::new()),
            handlers: Mutex::new(HashMap::new()),
            keyboards: Mutex::new(HashMap::new()),
            memberships: Mutex::new(HashMap::new()),
            broken_groups: Mutex::new(HashSet::new()),
            send_errors: Mutex::new(VecDeque::new()),
            edit_errors: Mutex::new(VecDeque::new()),
        }
    }

    /// Fail the next send with `error`
    pub fn queue_send_error(&self, error: ChannelError) {
        self.send_errors.lock().unwrap().push_back(error);
    }

    /// Fail the next edit (text or keyboard) with `error`
    pub fn queue_edit_error(&self, error: ChannelError) {
        self.edit_errors.lock().unwrap().push_back(error);
    }

    pub fn set_membership(&self, group: &str, user_id: i64, role: MemberRole) {
        self.memberships
            .lock()
            .unwrap()
            .insert((group.to_string(), user_id), role);
    }

    /// Membership lookups in `group` fail
    pub fn break_group(&self, group: &str) {
        self.broken_groups.lock().unwrap().insert(group.to_string());
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent().into_iter().map(|m| m.text).collect()
    }

    pub fn last_sent(&self) -> SentMessage {
        self.sent().pop().expect("nothing was sent")
    }

    pub fn edits(&self) -> Vec<EditedMessage> {
        self.edits.lock().unwrap().clone()
    }

    pub fn responses(&self) -> Vec<ActionResponse> {
        self.responses
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn last_response(&self) -> ActionResponse {
        self.responses().pop().expect("no press was answered")
    }

    pub fn typing_count(&self) -> usize {
        self.typing.lock().unwrap().len()
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().unwrap().len()
    }

    /// Current keyboard of a message, after edits.
    pub fn keyboard(&self, message: MessageRef) -> Option<InlineKeyboard> {
        self.keyboards.lock().unwrap().get(&message).cloned()
    }

    /// Wait until at least `n` messages were sent, for scheduled sends.
    pub async fn wait_for_sent(&self, n: usize) {
        let waited = tokio::time::timeout(Duration::from_secs(2), async {
            while self.sent.lock().unwrap().len() < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(
            waited.is_ok(),
            "expected {n} sent messages, got {:?}",
            self.sent_texts()
        );
    }

    /// Press the button labeled `label` on `message`, as `sender`.
    pub async fn press_on(
        &self,
        message: MessageRef,
        label: &str,
        sender: Sender,
    ) -> Result<(), ControlError> {
        let keyboard = self
            .keyboard(message)
            .unwrap_or_else(|| panic!("message {message:?} has no keyboard"));
        let button = keyboard
            .find(label)
            .unwrap_or_else(|| panic!("no button {label:?} in {keyboard:?}"))
            .clone();
        let handler = self
            .handlers
            .lock()
            .unwrap()
            .get(&button.action)
            .cloned()
            .unwrap_or_else(|| panic!("no handler registered for {label:?}"));
        let press = ActionPress {
            id: format!("press-{}", self.next_press.fetch_add(1, Ordering::SeqCst)),
            message,
            action: button.action,
            data: button.data,
        };
        let event = Event::action(sender, Chat::private(message.chat.0), press);
        handler.on_action(event).await
    }

    /// Press `label` on the most recently sent message that carries it.
    pub async fn press(&self, label: &str, sender: Sender) -> Result<(), ControlError> {
        let message = self
            .sent()
            .iter()
            .rev()
            .map(|m| m.message)
            .find(|m| self.keyboard(*m).is_some_and(|kb| kb.find(label).is_some()))
            .unwrap_or_else(|| panic!("no message carries button {label:?}"));
        self.press_on(message, label, sender).await
    }

    fn store_keyboard(&self, message: MessageRef, keyboard: Option<&InlineKeyboard>) {
        let mut keyboards = self.keyboards.lock().unwrap();
        match keyboard {
            Some(kb) => keyboards.insert(message, kb.clone()),
            None => keyboards.remove(&message),
        };
    }
}

#[async_trait]
impl Channel for MockChannel {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError> {
        if let Some(err) = self.send_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        let message = MessageRef::new(chat, MessageId(self.next_id.fetch_add(1, Ordering::SeqCst)));
        self.store_keyboard(message, options.keyboard.as_ref());
        self.sent.lock().unwrap().push(SentMessage {
            message,
            text: text.to_string(),
            options: options.clone(),
        });
        Ok(message)
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError> {
        if let Some(err) = self.edit_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.store_keyboard(message, options.keyboard.as_ref());
        self.edits.lock().unwrap().push(EditedMessage {
            message,
            text: Some(text.to_string()),
            keyboard: options.keyboard.clone(),
        });
        Ok(message)
    }

    async fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, ChannelError> {
        if let Some(err) = self.edit_errors.lock().unwrap().pop_front() {
            return Err(err);
        }
        self.store_keyboard(message, keyboard);
        self.edits.lock().unwrap().push(EditedMessage {
            message,
            text: None,
            keyboard: keyboard.cloned(),
        });
        Ok(message)
    }

    async fn respond(
        &self,
        press: &ActionPress,
        response: ActionResponse,
    ) -> Result<(), ChannelError> {
        self.responses
            .lock()
            .unwrap()
            .push((press.clone(), response));
        Ok(())
    }

    fn register_action(&self, action: &str, handler: Arc<dyn ActionHandler>) {
        self.handlers
            .lock()
            .unwrap()
            .insert(action.to_string(), handler);
    }

    async fn notify_typing(&self, chat: ChatId) -> Result<(), ChannelError> {
        self.typing.lock().unwrap().push(chat);
        Ok(())
    }

    async fn resolve_membership(
        &self,
        group: &str,
        user: &Sender,
    ) -> Result<MemberRole, ChannelError> {
        if self.broken_groups.lock().unwrap().contains(group) {
            return Err(ChannelError::not_found(format!("chat not found: {group}")));
        }
        Ok(self
            .memberships
            .lock()
            .unwrap()
            .get(&(group.to_string(), user.id))
            .copied()
            .unwrap_or(MemberRole::Left))
    }
}

// ============================================================================
// Probe Controller
// ============================================================================

/// Controller that only counts how often it was rendered
pub struct Probe {
    name: String,
    registry: Registry,
    handled: AtomicUsize,
    overwrite: AtomicBool,
    remove_buttons: AtomicBool,
}

impl Probe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            registry: Registry::new(),
            handled: AtomicUsize::new(0),
            overwrite: AtomicBool::new(false),
            remove_buttons: AtomicBool::new(false),
        }
    }

    pub fn handled(&self) -> usize {
        self.handled.load(Ordering::SeqCst)
    }

    pub fn set_value(&self, recipient: &str, value: &str) {
        self.registry.set_value(recipient, value);
    }

    pub fn set_outgoing(&self, recipient: &str, id: MessageId) {
        self.registry.register_outgoing(recipient, id);
    }

    pub fn overwrite(&self) -> bool {
        self.overwrite.load(Ordering::SeqCst)
    }

    pub fn remove_buttons(&self) -> bool {
        self.remove_buttons.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Controller for Probe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn handle(&self, _step: &Step, _event: &Event) -> Result<(), ControlError> {
        self.handled.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn value(&self, recipient: &str) -> Option<String> {
        self.registry.value(recipient)
    }

    fn outgoing_message_id(&self, recipient: &str) -> Option<MessageId> {
        self.registry.last_outgoing_id(recipient)
    }

    fn set_overwrite(&self, overwrite: bool) {
        self.overwrite.store(overwrite, Ordering::SeqCst);
    }

    fn set_remove_buttons(&self, remove: bool) {
        self.remove_buttons.store(remove, Ordering::SeqCst);
    }
}
