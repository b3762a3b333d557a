//! Built-in controls

mod input;
mod keyboard;
mod message;
mod picklist;
mod post_buttons;
mod rating;
mod subscription;

pub use input::Input;
pub use keyboard::{Keyboard, KeyboardCommand};
pub use message::Message;
pub use picklist::{Choices, Picklist, StaticChoices};
pub use post_buttons::PostButtons;
pub use rating::{Rating, Vote, VoteCounter};
pub use subscription::SubscriptionCheck;
