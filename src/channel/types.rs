//! Wire-level types exchanged with a chat channel

use serde::{Deserialize, Serialize};
use std::fmt;

const NONE: &str = "<none>";
const NOT_AVAILABLE: &str = "N/A";

/// Identifier of a message within a chat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier of a chat (private conversation, group or channel)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Address of a sent message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub chat: ChatId,
    pub id: MessageId,
}

impl MessageRef {
    pub fn new(chat: ChatId, id: MessageId) -> Self {
        Self { chat, id }
    }
}

/// The remote user that produced an event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_code: Option<String>,
}

impl Sender {
    pub fn new(id: i64) -> Self {
        Self {
            id,
            username: None,
            language_code: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = Some(language_code.into());
        self
    }

    /// Key under which per-user state is stored.
    pub fn recipient(&self) -> String {
        self.id.to_string()
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lang = self
            .language_code
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(NOT_AVAILABLE);
        write!(
            f,
            "<[ID {}] {} ({lang})>",
            self.id,
            self.username.as_deref().unwrap_or(NONE)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// The chat an event arrived in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

impl Chat {
    pub fn private(id: i64) -> Self {
        Self {
            id: ChatId(id),
            kind: ChatKind::Private,
            title: None,
        }
    }

    pub fn group(id: i64, title: impl Into<String>) -> Self {
        Self {
            id: ChatId(id),
            kind: ChatKind::Group,
            title: Some(title.into()),
        }
    }

    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

impl fmt::Display for Chat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.kind, &self.title) {
            (ChatKind::Private, _) => write!(f, "private:<[{}]>", self.id),
            (kind, Some(title)) => write!(f, "<[{}] {kind:?} ({title:?})>", self.id),
            (kind, None) => write!(f, "<[{}] {kind:?}>", self.id),
        }
    }
}

/// A text message written by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub id: MessageId,
    pub text: String,
}

/// An inline button press
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionPress {
    /// Channel-assigned id used to answer the press
    pub id: String,
    /// Message carrying the pressed button
    pub message: MessageRef,
    /// Action token the button was registered under
    pub action: String,
    /// Raw data attached to the button
    pub data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    Command { text: String },
    Text(IncomingMessage),
    Action(ActionPress),
}

/// An inbound interaction delivered by the channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub sender: Sender,
    pub chat: Chat,
    pub payload: Payload,
}

impl Event {
    pub fn command(sender: Sender, chat: Chat, text: impl Into<String>) -> Self {
        Self {
            sender,
            chat,
            payload: Payload::Command { text: text.into() },
        }
    }

    pub fn text(sender: Sender, chat: Chat, id: MessageId, text: impl Into<String>) -> Self {
        Self {
            sender,
            chat,
            payload: Payload::Text(IncomingMessage {
                id,
                text: text.into(),
            }),
        }
    }

    pub fn action(sender: Sender, chat: Chat, press: ActionPress) -> Self {
        Self {
            sender,
            chat,
            payload: Payload::Action(press),
        }
    }

    pub fn recipient(&self) -> String {
        self.sender.recipient()
    }

    pub fn is_private(&self) -> bool {
        self.chat.is_private()
    }

    pub fn language(&self) -> Option<&str> {
        self.sender
            .language_code
            .as_deref()
            .filter(|l| !l.is_empty())
    }

    pub fn message(&self) -> Option<&IncomingMessage> {
        match &self.payload {
            Payload::Text(m) => Some(m),
            _ => None,
        }
    }

    pub fn press(&self) -> Option<&ActionPress> {
        match &self.payload {
            Payload::Action(p) => Some(p),
            _ => None,
        }
    }

    /// Pretty JSON dump for debug logging.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}

/// A button attached to a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineButton {
    pub label: String,
    pub action: String,
    pub data: String,
}

/// Inline keyboard, rows of buttons
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    pub fn new(rows: Vec<Vec<InlineButton>>) -> Self {
        Self { rows }
    }

    pub fn buttons(&self) -> impl Iterator<Item = &InlineButton> {
        self.rows.iter().flatten()
    }

    pub fn find(&self, label: &str) -> Option<&InlineButton> {
        self.buttons().find(|b| b.label == label)
    }

    /// Button counts per row.
    pub fn shape(&self) -> Vec<usize> {
        self.rows.iter().map(Vec::len).collect()
    }
}

/// Persistent keyboard shown in place of the text field. A press sends the
/// button label as a text message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyKeyboard {
    pub rows: Vec<Vec<String>>,
    /// Let the client shrink the keyboard to fit its buttons
    #[serde(default)]
    pub resize: bool,
}

impl ReplyKeyboard {
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().flatten().map(String::as_str)
    }
}

/// Options for sending or editing a message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyboard: Option<InlineKeyboard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_keyboard: Option<ReplyKeyboard>,
    /// Ask the client to show a reply prompt
    #[serde(default)]
    pub force_reply: bool,
    /// Deliver without notification
    #[serde(default)]
    pub silent: bool,
}

impl SendOptions {
    pub fn with_keyboard(&self, keyboard: InlineKeyboard) -> Self {
        Self {
            keyboard: Some(keyboard),
            ..self.clone()
        }
    }

    pub fn with_reply_keyboard(&self, keyboard: ReplyKeyboard) -> Self {
        Self {
            reply_keyboard: Some(keyboard),
            ..self.clone()
        }
    }

    pub fn without_keyboard(&self) -> Self {
        Self {
            keyboard: None,
            ..self.clone()
        }
    }
}

/// Answer to a button press
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default)]
    pub show_alert: bool,
}

impl ActionResponse {
    /// Acknowledge without showing anything.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            show_alert: false,
        }
    }

    pub fn alert(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            show_alert: true,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.as_deref().is_none_or(str::is_empty)
    }
}

/// Role of a user in a group or channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberRole {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
    Unknown,
}

impl MemberRole {
    /// Whether the role counts as being subscribed.
    pub fn is_member(&self) -> bool {
        !matches!(self, Self::Left | Self::Kicked | Self::Unknown)
    }
}
