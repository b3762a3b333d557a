//! Callback outcomes
//!
//! Every validation callback answers with an [`Outcome`] that tells the
//! control how to continue the interaction.

use crate::error::BoxError;

/// Message shown to the user alongside an outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    /// Show as a modal alert instead of a transient toast
    pub alert: bool,
}

impl Notice {
    pub fn new(text: impl Into<String>, alert: bool) -> Self {
        Self {
            text: text.into(),
            alert,
        }
    }
}

/// Result of a validation callback
#[derive(Debug)]
pub enum Outcome {
    /// Value accepted, store it and advance
    Accept,
    /// Nothing changed, acknowledge silently and stay
    NoChange,
    /// Value rejected, show the notice and let the user try again
    Retry(Notice),
    /// Value accepted with a message for the user
    Notice(Notice),
    /// Return to the previous control
    Back,
    /// Unexpected failure, abort the interaction
    Fatal(BoxError),
}

impl Outcome {
    /// Rejected choice shown as an alert.
    pub fn retry(text: impl Into<String>) -> Self {
        Self::Retry(Notice::new(text, true))
    }

    /// Rejected free-text input, the user is prompted again.
    pub fn input_error(text: impl Into<String>) -> Self {
        Self::Retry(Notice::new(text, false))
    }

    pub fn notice(text: impl Into<String>, alert: bool) -> Self {
        Self::Notice(Notice::new(text, alert))
    }

    pub fn fatal(err: impl Into<BoxError>) -> Self {
        Self::Fatal(err.into())
    }

    /// Short name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Accept => "accept",
            Self::NoChange => "no_change",
            Self::Retry(_) => "retry",
            Self::Notice(_) => "notice",
            Self::Back => "back",
            Self::Fatal(_) => "fatal",
        }
    }
}

impl<E: Into<BoxError>> From<Result<(), E>> for Outcome {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::Accept,
            Err(e) => Self::Fatal(e.into()),
        }
    }
}
