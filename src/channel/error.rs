//! Channel error types

use thiserror::Error;

/// Channel error with classification
#[derive(Debug, Error)]
#[error("{message}")]
pub struct ChannelError {
    pub kind: ChannelErrorKind,
    pub message: String,
}

impl ChannelError {
    pub fn new(kind: ChannelErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn not_modified(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::NotModified, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::NotFound, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Forbidden, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::RateLimited, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Network, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ChannelErrorKind::Unknown, message)
    }

    /// The edit would not change the message content.
    pub fn is_not_modified(&self) -> bool {
        self.kind == ChannelErrorKind::NotModified
    }
}

/// Error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelErrorKind {
    /// Edit rejected because content and markup are unchanged
    NotModified,
    /// Message or chat does not exist (or is too old to edit)
    NotFound,
    /// Bot is blocked or lacks permissions
    Forbidden,
    /// Too many requests
    RateLimited,
    /// Transport failure
    Network,
    Unknown,
}
