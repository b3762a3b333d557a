//! Reply keyboard of text commands
//!
//! Each label maps to a handler. Labels are translated per language; once a
//! language's keyboard has been built, a text message matching one of its
//! labels runs the label's handler.

use crate::channel::{Event, MessageRef, ReplyKeyboard, SendOptions};
use crate::config::{validate_language, Services};
use crate::error::{ConfigError, ControlError};
use crate::form::TextHandler;
use crate::layout::{clamp_per_row, pack_even};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

pub struct KeyboardCommand {
    /// Untranslated label, also the translation key
    pub label: String,
    pub handler: TextHandler,
}

impl KeyboardCommand {
    pub fn new(label: impl Into<String>, handler: TextHandler) -> Self {
        Self {
            label: label.into(),
            handler,
        }
    }
}

pub struct Keyboard {
    services: Services,
    commands: Vec<KeyboardCommand>,
    per_row: usize,
    // translated label -> command index
    routes: RwLock<HashMap<String, usize>>,
}

impl Keyboard {
    pub fn new(services: Services, commands: Vec<KeyboardCommand>) -> Self {
        let per_row = services.config.max_buttons_per_row;
        Self {
            services,
            commands,
            per_row,
            routes: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_buttons_per_row(mut self, per_row: usize) -> Self {
        self.per_row = clamp_per_row(per_row);
        self
    }

    pub fn with_fallback_lang(mut self, lang: &str) -> Result<Self, ConfigError> {
        validate_language(lang)?;
        self.services.config.fallback_lang = lang.to_string();
        Ok(self)
    }

    /// Keyboard with labels translated for `lang`. Its labels are routed to
    /// their handlers from now on.
    pub fn markup(&self, lang: &str) -> ReplyKeyboard {
        let fallback = &self.services.config.fallback_lang;
        let labels: Vec<String> = self
            .commands
            .iter()
            .map(|cmd| self.services.translator.resolve(lang, &cmd.label, fallback))
            .collect();
        {
            let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
            for (index, label) in labels.iter().enumerate() {
                routes.insert(label.clone(), index);
            }
        }
        tracing::debug!(lang, buttons = labels.len(), "Prepared reply keyboard");
        ReplyKeyboard {
            rows: pack_even(labels, self.per_row),
            resize: true,
        }
    }

    /// Prepares routes for every language in `langs` up front.
    pub fn init_for_languages(&self, langs: &[&str]) {
        for lang in langs {
            self.markup(lang);
        }
    }

    /// Sends `text` with the keyboard in the sender's language.
    pub async fn send(&self, event: &Event, text: &str) -> Result<MessageRef, ControlError> {
        let lang = event
            .language()
            .unwrap_or(&self.services.config.fallback_lang);
        let options = SendOptions::default().with_reply_keyboard(self.markup(lang));
        Ok(self
            .services
            .channel
            .send(event.chat.id, text, &options)
            .await?)
    }

    /// Runs the handler of the label sent in `event`. Returns `false` when
    /// the text is not a known label.
    pub async fn handle(&self, event: &Event) -> Result<bool, ControlError> {
        let Some(message) = event.message() else {
            return Ok(false);
        };
        let index = self
            .routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&message.text)
            .copied();
        let Some(command) = index.and_then(|i| self.commands.get(i)) else {
            return Ok(false);
        };
        tracing::info!(
            sender = %event.sender,
            chat = %event.chat,
            label = %command.label,
            "Keyboard command"
        );
        (command.handler)(event.clone()).await?;
        Ok(true)
    }

    /// Text handler running keyboard commands, passing other text on to
    /// `fallback`. Suits [`crate::Form::text_middleware`].
    pub fn text_handler(self: &Arc<Self>, fallback: Option<TextHandler>) -> TextHandler {
        let keyboard = Arc::clone(self);
        Arc::new(move |event| {
            let keyboard = keyboard.clone();
            let fallback = fallback.clone();
            Box::pin(async move {
                if keyboard.handle(&event).await? {
                    return Ok(());
                }
                match fallback {
                    Some(fallback) => fallback(event).await,
                    None => Ok(()),
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::testing::{text_event, user, MockChannel};
    use crate::channel::Chat;
    use crate::i18n::Catalog;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counting(counter: &Arc<AtomicUsize>) -> TextHandler {
        let counter = counter.clone();
        Arc::new(move |_event| {
            let counter = counter.clone();
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
    }

    fn services(channel: &Arc<MockChannel>) -> Services {
        let catalog = Catalog::builtin()
            .with("ru", "Help", "Помощь")
            .with("ru", "Settings", "Настройки");
        Services::new(channel.clone(), Arc::new(catalog))
    }

    struct Fixture {
        channel: Arc<MockChannel>,
        help: Arc<AtomicUsize>,
        settings: Arc<AtomicUsize>,
        keyboard: Arc<Keyboard>,
    }

    impl Fixture {
        fn new() -> Self {
            let channel = Arc::new(MockChannel::new());
            let help = Arc::new(AtomicUsize::new(0));
            let settings = Arc::new(AtomicUsize::new(0));
            let keyboard = Keyboard::new(
                services(&channel),
                vec![
                    KeyboardCommand::new("Help", counting(&help)),
                    KeyboardCommand::new("Settings", counting(&settings)),
                ],
            );
            Self {
                channel,
                help,
                settings,
                keyboard: Arc::new(keyboard),
            }
        }
    }

    #[test]
    fn test_markup_rows() {
        let channel = Arc::new(MockChannel::new());
        let commands = ["a", "b", "c", "d", "e"]
            .into_iter()
            .map(|l| KeyboardCommand::new(l, counting(&Arc::new(AtomicUsize::new(0)))))
            .collect();
        let keyboard = Keyboard::new(services(&channel), commands).with_buttons_per_row(2);
        let markup = keyboard.markup("en");
        assert!(markup.resize);
        let shape: Vec<usize> = markup.rows.iter().map(Vec::len).collect();
        assert_eq!(shape, vec![2, 2, 1]);
        assert_eq!(markup.labels().collect::<Vec<_>>(), vec!["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn test_label_runs_its_handler() {
        let fx = Fixture::new();
        fx.keyboard.markup("en-US");

        assert!(fx.keyboard.handle(&text_event(1, 1, "Settings")).await.unwrap());
        assert_eq!(fx.help.load(Ordering::SeqCst), 0);
        assert_eq!(fx.settings.load(Ordering::SeqCst), 1);

        assert!(!fx.keyboard.handle(&text_event(1, 1, "hello")).await.unwrap());
        assert_eq!(fx.settings.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_labels_unknown_before_markup() {
        let fx = Fixture::new();
        assert!(!fx.keyboard.handle(&text_event(1, 1, "Help")).await.unwrap());
        assert_eq!(fx.help.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_init_for_languages_routes_translations() {
        let fx = Fixture::new();
        assert!(!fx.keyboard.handle(&text_event(1, 1, "Помощь")).await.unwrap());

        fx.keyboard.init_for_languages(&["en", "ru"]);
        assert!(fx.keyboard.handle(&text_event(1, 1, "Помощь")).await.unwrap());
        assert!(fx.keyboard.handle(&text_event(1, 1, "Help")).await.unwrap());
        assert_eq!(fx.help.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_send_in_sender_language() {
        let fx = Fixture::new();
        let event = Event::command(user(1).with_language("ru-RU"), Chat::private(1), "/menu");
        fx.keyboard.send(&event, "Menu").await.unwrap();

        let sent = fx.channel.last_sent();
        assert_eq!(sent.text, "Menu");
        let markup = sent.options.reply_keyboard.unwrap();
        assert_eq!(markup.labels().collect::<Vec<_>>(), vec!["Помощь", "Настройки"]);
        assert!(sent.options.keyboard.is_none());
    }

    #[tokio::test]
    async fn test_text_handler_falls_back() {
        let fx = Fixture::new();
        fx.keyboard.markup("en");
        let other = Arc::new(AtomicUsize::new(0));
        let handler = fx.keyboard.text_handler(Some(counting(&other)));

        handler(text_event(1, 1, "Help")).await.unwrap();
        handler(text_event(1, 1, "what?")).await.unwrap();
        assert_eq!(fx.help.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 1);

        let handler = fx.keyboard.text_handler(None);
        handler(text_event(1, 1, "what?")).await.unwrap();
        assert_eq!(other.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_handler_error_propagates() {
        let channel = Arc::new(MockChannel::new());
        let failing: TextHandler =
            Arc::new(|_event| Box::pin(async { Err::<(), _>(ControlError::FormDropped) }));
        let keyboard =
            Keyboard::new(services(&channel), vec![KeyboardCommand::new("Help", failing)]);
        keyboard.markup("en");
        let err = keyboard.handle(&text_event(1, 1, "Help")).await.unwrap_err();
        assert!(matches!(err, ControlError::FormDropped));
    }

    #[test]
    fn test_invalid_fallback_lang() {
        let channel = Arc::new(MockChannel::new());
        let result = Keyboard::new(services(&channel), Vec::new()).with_fallback_lang("english!");
        assert!(matches!(result, Err(ConfigError::InvalidLanguage(_))));
    }
}
