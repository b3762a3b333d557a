//! Console demo: drives a sign-up form from stdin.
//!
//! `/start` starts the form, `#label` presses a button on the latest
//! message carrying it, `/quit` exits. Any other line is a text reply;
//! typing a reply keyboard label runs its command.

use async_trait::async_trait;
use chatctl::channel::{
    ActionHandler, ActionPress, ActionResponse, Chat, ChatId, InlineKeyboard, MemberRole,
    MessageId, MessageRef, SendOptions, Sender,
};
use chatctl::{
    Call, Catalog, Channel, ChannelError, Controller, ControlsConfig, Event, Form, Input,
    Keyboard, KeyboardCommand, Message, Outcome, Picklist, Services, StaticChoices, TextFn,
    TextHandler,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USER_ID: i64 = 1;

/// Channel printing to stdout
#[derive(Default)]
struct ConsoleChannel {
    next_id: AtomicI64,
    handlers: Mutex<HashMap<String, Arc<dyn ActionHandler>>>,
    keyboards: Mutex<Vec<(MessageRef, InlineKeyboard)>>,
}

impl ConsoleChannel {
    fn print(&self, message: MessageRef, text: &str, keyboard: Option<&InlineKeyboard>) {
        println!("[bot #{}] {text}", message.id);
        if let Some(keyboard) = keyboard {
            for row in &keyboard.rows {
                let labels: Vec<String> = row.iter().map(|b| format!("[ {} ]", b.label)).collect();
                println!("    {}", labels.join(" "));
            }
        }
        self.keep_keyboard(message, keyboard);
    }

    fn keep_keyboard(&self, message: MessageRef, keyboard: Option<&InlineKeyboard>) {
        let mut keyboards = self.keyboards.lock().unwrap_or_else(PoisonError::into_inner);
        keyboards.retain(|(m, _)| *m != message);
        if let Some(keyboard) = keyboard {
            keyboards.push((message, keyboard.clone()));
        }
    }

    /// Builds the press event for `label` on the newest message showing it.
    fn press(&self, sender: &Sender, label: &str) -> Option<(Event, Arc<dyn ActionHandler>)> {
        let (message, button) = {
            let keyboards = self.keyboards.lock().unwrap_or_else(PoisonError::into_inner);
            keyboards
                .iter()
                .rev()
                .find_map(|(m, kb)| kb.find(label).map(|b| (*m, b.clone())))?
        };
        let handler = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&button.action)
            .cloned()?;
        let press = ActionPress {
            id: format!("console-{}", self.next_id.fetch_add(1, Ordering::Relaxed)),
            message,
            action: button.action,
            data: button.data,
        };
        Some((
            Event::action(sender.clone(), Chat::private(message.chat.0), press),
            handler,
        ))
    }
}

#[async_trait]
impl Channel for ConsoleChannel {
    async fn send(
        &self,
        chat: ChatId,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError> {
        let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let message = MessageRef::new(chat, id);
        self.print(message, text, options.keyboard.as_ref());
        if let Some(reply) = &options.reply_keyboard {
            for row in &reply.rows {
                let labels: Vec<String> = row.iter().map(|l| format!("< {l} >")).collect();
                println!("    {}", labels.join(" "));
            }
        }
        Ok(message)
    }

    async fn edit(
        &self,
        message: MessageRef,
        text: &str,
        options: &SendOptions,
    ) -> Result<MessageRef, ChannelError> {
        print!("(edited) ");
        self.print(message, text, options.keyboard.as_ref());
        Ok(message)
    }

    async fn edit_keyboard(
        &self,
        message: MessageRef,
        keyboard: Option<&InlineKeyboard>,
    ) -> Result<MessageRef, ChannelError> {
        self.keep_keyboard(message, keyboard);
        Ok(message)
    }

    async fn respond(
        &self,
        _press: &ActionPress,
        response: ActionResponse,
    ) -> Result<(), ChannelError> {
        match response.text.as_deref() {
            Some(text) if response.show_alert => println!("    /!\\ {text}"),
            Some(text) if !text.is_empty() => println!("    ({text})"),
            _ => {}
        }
        Ok(())
    }

    fn register_action(&self, action: &str, handler: Arc<dyn ActionHandler>) {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(action.to_string(), handler);
    }

    async fn notify_typing(&self, _chat: ChatId) -> Result<(), ChannelError> {
        println!("    ...");
        Ok(())
    }

    async fn resolve_membership(
        &self,
        _group: &str,
        _user: &Sender,
    ) -> Result<MemberRole, ChannelError> {
        Ok(MemberRole::Member)
    }
}

fn build_form(services: &Services) -> Result<Arc<Form>, Box<dyn std::error::Error>> {
    let name = Input::new("name", services.clone(), "Input your name");
    let age = Input::new("age", services.clone(), "Input your age").with_validator(
        |_: &Call<'_>, text: &str| match text.trim().parse::<u8>() {
            Ok(_) => Outcome::Accept,
            Err(_) => Outcome::input_error("Please enter your age as a number"),
        },
    );
    let colour = Picklist::new(
        "colour",
        services.clone(),
        StaticChoices::new("Favourite colour?", ["red", "green", "blue", "black"]),
    )
    .with_back_button("Back")
    .with_choose_hint(true);
    let done = Message::new(
        "done",
        services.clone(),
        TextFn(|call: &Call<'_>| {
            let data = call.form_data();
            Ok(format!(
                "Thanks, {}! Age {}, likes {}.",
                data.get("name").map_or("?", String::as_str),
                data.get("age").map_or("?", String::as_str),
                data.get("colour").map_or("?", String::as_str),
            ))
        }),
    );
    Ok(Form::new(vec![
        Arc::new(name) as Arc<dyn Controller>,
        Arc::new(age),
        Arc::new(colour),
        Arc::new(done),
    ])?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("CHATCTL_LOG")
                .unwrap_or_else(|_| "chatctl=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = ControlsConfig::from_env()?;
    let channel = Arc::new(ConsoleChannel::default());
    let services = Services::new(channel.clone(), Arc::new(Catalog::builtin())).with_config(config);
    let form = build_form(&services)?;

    let restart_form = form.clone();
    let restart: TextHandler = Arc::new(move |event| {
        let form = restart_form.clone();
        Box::pin(async move { form.handle(&event).await })
    });
    let menu = Arc::new(Keyboard::new(
        services.clone(),
        vec![KeyboardCommand::new("Start over", restart)],
    ));
    let texts = form.text_middleware(Some(menu.text_handler(None)));

    // LANG looks like "ru_RU.UTF-8"
    let lang = std::env::var("LANG").unwrap_or_default();
    let lang = lang.split('.').next().unwrap_or_default().replace('_', "-");
    let sender = Sender::new(USER_ID)
        .with_username("console")
        .with_language(lang);
    let chat = Chat::private(USER_ID);
    let mut incoming = 0;

    println!("/start to begin, #label to press a button, /quit to exit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let result = match line {
            "" => continue,
            "/quit" => break,
            "/start" => {
                let event = Event::command(sender.clone(), chat.clone(), line);
                match menu.send(&event, "Type \"Start over\" to begin again").await {
                    Ok(_) => form.handle(&event).await,
                    Err(e) => Err(e),
                }
            }
            _ => {
                if let Some(label) = line.strip_prefix('#') {
                    match channel.press(&sender, label) {
                        Some((event, handler)) => handler.on_action(event).await,
                        None => {
                            println!("no button {label:?}");
                            continue;
                        }
                    }
                } else {
                    incoming += 1;
                    let event =
                        Event::text(sender.clone(), chat.clone(), MessageId(incoming), line);
                    texts.handle(event).await
                }
            }
        };
        if let Err(e) = result {
            tracing::error!(error = %e, "Interaction failed");
        }
    }
    Ok(())
}
