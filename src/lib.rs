//! chatctl - stateful chat controls chained into forms
//!
//! Controls (text inputs, pick-lists, messages, ratings, subscription checks)
//! keep per-user interaction state and hand the conversation to each other
//! in the order of their [`Form`]. Reply keyboards and post buttons route
//! presses to plain handlers outside any form. The chat transport stays outside the
//! crate, behind the [`Channel`] trait.
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use chatctl::{Channel, Catalog, Controller, Event, Form, Input, Message, Services};
//! # type Error = Box<dyn std::error::Error>;
//! # async fn run(channel: Arc<dyn Channel>, start: Event) -> Result<(), Error> {
//! let services = Services::new(channel, Arc::new(Catalog::builtin()));
//! let form = Form::new(vec![
//!     Arc::new(Input::new("name", services.clone(), "Input your name")) as Arc<dyn Controller>,
//!     Arc::new(Message::new("done", services, "Thank you!")),
//! ])?;
//! let texts = form.text_middleware(None);
//! form.handle(&start).await?;
//! # let _ = texts;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod config;
pub mod controller;
pub mod controls;
pub mod error;
pub mod form;
pub mod i18n;
pub mod layout;
pub mod outcome;
pub mod registry;

pub use channel::{Channel, ChannelError, Event, Translator};
pub use config::{ControlsConfig, Services};
pub use controller::{Call, Controller, Step, TextFn, TextInput, TextValidator, Texter};
pub use controls::{
    Choices, Input, Keyboard, KeyboardCommand, Message, Picklist, PostButtons, Rating,
    StaticChoices, SubscriptionCheck, Vote, VoteCounter,
};
pub use error::{BoxError, ConfigError, ControlError, FormError};
pub use form::{Form, TextHandler, TextMiddleware};
pub use i18n::Catalog;
pub use outcome::{Notice, Outcome};
