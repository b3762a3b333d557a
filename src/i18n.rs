//! Localized user-facing messages
//!
//! Message keys are the English texts. [`Catalog`] resolves them for a
//! language tag, trying the exact tag, then its primary subtag, then the
//! fallback tag, and finally returning the key unchanged.

use crate::channel::Translator;
use std::collections::HashMap;

pub const MSG_UNEXPECTED: &str = "Unexpected error occurred.";
pub const MSG_RETRY: &str = "Incorrect choice.";
pub const MSG_CHOOSE_VAL: &str = "Choose value from the list:";
pub const MSG_OK: &str = "Changed successfully.";
pub const MSG_VOTE_COUNTED: &str = "Vote counted.";
pub const MSG_ALREADY_VOTED: &str = "You have already voted.";
pub const MSG_SUB_CHECK: &str = "Check subscription";
pub const MSG_SUB_NO_SUB: &str = "You are not subscribed";

/// In-memory translation table
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    // lang tag -> key -> text
    tables: HashMap<String, HashMap<String, String>>,
}

impl Catalog {
    /// Empty catalog, every key resolves to itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with English and Russian texts for the built-in messages.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for (key, en, ru) in [
            (MSG_UNEXPECTED, MSG_UNEXPECTED, "Произошло недоразумение."),
            (MSG_RETRY, MSG_RETRY, "Неверный выбор"),
            (MSG_CHOOSE_VAL, MSG_CHOOSE_VAL, "Сделайте выбор из списка:"),
            (MSG_OK, MSG_OK, "Успешно изменено."),
            (MSG_VOTE_COUNTED, MSG_VOTE_COUNTED, "Голос учтен."),
            (MSG_ALREADY_VOTED, MSG_ALREADY_VOTED, "Вы уже проголосовали."),
            (MSG_SUB_CHECK, MSG_SUB_CHECK, "Проверить подписку"),
            (MSG_SUB_NO_SUB, MSG_SUB_NO_SUB, "Вы не подписаны"),
        ] {
            catalog.insert("en", key, en);
            catalog.insert("ru", key, ru);
        }
        catalog
    }

    pub fn insert(&mut self, lang: &str, key: impl Into<String>, text: impl Into<String>) {
        self.tables
            .entry(lang.to_ascii_lowercase())
            .or_default()
            .insert(key.into(), text.into());
    }

    pub fn with(mut self, lang: &str, key: impl Into<String>, text: impl Into<String>) -> Self {
        self.insert(lang, key, text);
        self
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        let lang = lang.to_ascii_lowercase();
        let exact = self.tables.get(&lang).and_then(|t| t.get(key));
        exact
            .or_else(|| {
                let primary = lang.split('-').next()?;
                self.tables.get(primary)?.get(key)
            })
            .map(String::as_str)
    }
}

impl Translator for Catalog {
    fn resolve(&self, lang: &str, key: &str, fallback: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(fallback, key))
            .unwrap_or(key)
            .to_string()
    }
}
