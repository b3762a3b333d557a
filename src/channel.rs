//! Chat channel abstraction
//!
//! The transport that delivers events and carries messages is external to
//! this crate; controls only see the [`Channel`] and [`Translator`] traits.

mod error;
mod traits;
mod types;

#[cfg(test)]
pub mod testing;

pub use error::{ChannelError, ChannelErrorKind};
pub use traits::{ActionHandler, Channel, Translator};
pub use types::*;
