//! Per-recipient interaction state of a single control

use crate::channel::MessageId;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use uuid::Uuid;

const UNKNOWN: &str = "[unknown]";

#[derive(Debug, Clone, Copy)]
struct Correlation {
    id: Uuid,
    sent_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Entry {
    value: Option<String>,
    waiting: Option<MessageId>,
    last_outgoing: Option<MessageId>,
    correlations: HashMap<MessageId, Correlation>,
}

/// Correlation data of an outgoing message, for logging
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrelationInfo {
    /// Correlation id, or `[unknown]` when the message is not registered
    pub id: String,
    pub sent_at: Option<DateTime<Utc>>,
}

impl CorrelationInfo {
    /// Milliseconds elapsed since the message was sent.
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.sent_at
            .map(|at| Utc::now().signed_duration_since(at).num_milliseconds())
    }
}

impl fmt::Display for CorrelationInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

/// Store of values, wait markers and outgoing messages keyed by recipient.
///
/// Entries are created lazily on first write and never expire.
#[derive(Debug, Default)]
pub struct Registry {
    entries: RwLock<HashMap<String, Entry>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<R>(&self, recipient: &str, f: impl FnOnce(&Entry) -> R) -> Option<R> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(recipient).map(f)
    }

    fn write<R>(&self, recipient: &str, f: impl FnOnce(&mut Entry) -> R) -> R {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        f(entries.entry(recipient.to_string()).or_default())
    }

    pub fn set_value(&self, recipient: &str, value: impl Into<String>) {
        let value = value.into();
        self.write(recipient, |e| e.value = Some(value));
    }

    pub fn value(&self, recipient: &str) -> Option<String> {
        self.read(recipient, |e| e.value.clone()).flatten()
    }

    /// Marks the recipient as awaiting a reply to `message_id`, replacing any
    /// previous wait.
    pub fn begin_wait(&self, recipient: &str, message_id: MessageId) {
        self.write(recipient, |e| e.waiting = Some(message_id));
    }

    /// Clears the wait marker, returning the message that was awaited.
    pub fn end_wait(&self, recipient: &str) -> Option<MessageId> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.get_mut(recipient).and_then(|e| e.waiting.take())
    }

    pub fn is_waiting(&self, recipient: &str) -> bool {
        self.waiting_message_id(recipient).is_some()
    }

    pub fn waiting_message_id(&self, recipient: &str) -> Option<MessageId> {
        self.read(recipient, |e| e.waiting).flatten()
    }

    /// Records an outgoing message and returns its new correlation id.
    pub fn register_outgoing(&self, recipient: &str, message_id: MessageId) -> Uuid {
        let correlation = Correlation {
            id: Uuid::new_v4(),
            sent_at: Utc::now(),
        };
        self.write(recipient, |e| {
            e.correlations.insert(message_id, correlation);
            e.last_outgoing = Some(message_id);
        });
        correlation.id
    }

    pub fn unregister_outgoing(&self, recipient: &str, message_id: MessageId) {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(entry) = entries.get_mut(recipient) {
            entry.correlations.remove(&message_id);
        }
    }

    pub fn correlation_info(&self, recipient: &str, message_id: MessageId) -> CorrelationInfo {
        match self
            .read(recipient, |e| e.correlations.get(&message_id).copied())
            .flatten()
        {
            Some(c) => CorrelationInfo {
                id: c.id.to_string(),
                sent_at: Some(c.sent_at),
            },
            None => CorrelationInfo {
                id: UNKNOWN.to_string(),
                sent_at: None,
            },
        }
    }

    pub fn last_outgoing_id(&self, recipient: &str) -> Option<MessageId> {
        self.read(recipient, |e| e.last_outgoing).flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_wait_lifecycle() {
        let reg = Registry::new();
        assert!(!reg.is_waiting("1"));
        assert_eq!(reg.end_wait("1"), None);

        reg.begin_wait("1", MessageId(5));
        assert!(reg.is_waiting("1"));
        assert!(!reg.is_waiting("2"));
        assert_eq!(reg.end_wait("1"), Some(MessageId(5)));
        assert!(!reg.is_waiting("1"));
        assert_eq!(reg.end_wait("1"), None);
    }

    #[test]
    fn test_begin_wait_overwrites() {
        let reg = Registry::new();
        reg.begin_wait("1", MessageId(5));
        reg.begin_wait("1", MessageId(6));
        assert_eq!(reg.waiting_message_id("1"), Some(MessageId(6)));
    }

    #[test]
    fn test_values() {
        let reg = Registry::new();
        assert_eq!(reg.value("1"), None);
        reg.set_value("1", "red");
        reg.set_value("2", "blue");
        reg.set_value("1", "green");
        assert_eq!(reg.value("1").as_deref(), Some("green"));
        assert_eq!(reg.value("2").as_deref(), Some("blue"));
    }

    #[test]
    fn test_outgoing_and_correlation() {
        let reg = Registry::new();
        let unknown = reg.correlation_info("1", MessageId(10));
        assert_eq!(unknown.id, "[unknown]");
        assert_eq!(unknown.sent_at, None);
        assert_eq!(unknown.elapsed_ms(), None);

        let id = reg.register_outgoing("1", MessageId(10));
        let info = reg.correlation_info("1", MessageId(10));
        assert_eq!(info.id, id.to_string());
        assert!(info.elapsed_ms().is_some_and(|ms| ms >= 0));
        assert_eq!(reg.last_outgoing_id("1"), Some(MessageId(10)));

        reg.register_outgoing("1", MessageId(11));
        assert_eq!(reg.last_outgoing_id("1"), Some(MessageId(11)));

        reg.unregister_outgoing("1", MessageId(10));
        reg.unregister_outgoing("1", MessageId(10));
        reg.unregister_outgoing("9", MessageId(10));
        assert_eq!(reg.correlation_info("1", MessageId(10)).id, "[unknown]");
        // the last outgoing id survives unregistering
        assert_eq!(reg.last_outgoing_id("1"), Some(MessageId(11)));
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let reg = Arc::new(Registry::new());
        let mut handles = Vec::new();
        for i in 0..16i64 {
            let reg = Arc::clone(&reg);
            handles.push(tokio::spawn(async move {
                let recipient = (i % 4).to_string();
                reg.set_value(&recipient, i.to_string());
                reg.begin_wait(&recipient, MessageId(i));
                reg.register_outgoing(&recipient, MessageId(i));
                reg.is_waiting(&recipient)
            }));
        }
        for h in handles {
            assert!(h.await.unwrap());
        }
        for r in 0..4 {
            assert!(reg.value(&r.to_string()).is_some());
        }
    }
}
