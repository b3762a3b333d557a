//! Error types for controls and forms

use crate::channel::ChannelError;
use crate::layout::LayoutError;
use thiserror::Error;

/// Error type for failures raised by caller-supplied functions
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced while handling an interaction
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("invalid button layout: {0}")]
    Layout(#[from] LayoutError),

    #[error("{control}: error while generating text: {source}")]
    Text {
        control: String,
        #[source]
        source: BoxError,
    },

    #[error("{control}: error while resolving values: {source}")]
    Values {
        control: String,
        #[source]
        source: BoxError,
    },

    #[error("{control}: callback failed: {source}")]
    Callback {
        control: String,
        #[source]
        source: BoxError,
    },

    #[error("form is no longer available")]
    FormDropped,
}

impl ControlError {
    pub fn text(control: &str, source: BoxError) -> Self {
        Self::Text {
            control: control.to_string(),
            source,
        }
    }

    pub fn values(control: &str, source: BoxError) -> Self {
        Self::Values {
            control: control.to_string(),
            source,
        }
    }

    pub fn callback(control: &str, source: BoxError) -> Self {
        Self::Callback {
            control: control.to_string(),
            source,
        }
    }
}

/// Errors detected while assembling a form
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("creating form with no controllers")]
    Empty,
    #[error("controller {0} already exists")]
    DuplicateName(String),
}

/// Invalid control configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("invalid language tag: {0:?}")]
    InvalidLanguage(String),
    #[error("invalid button pattern: {0}")]
    InvalidPattern(#[from] LayoutError),
    #[error("invalid value for {name}: {value:?}")]
    InvalidNumber { name: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_error_display() {
        let err = ControlError::text("age", "boom".into());
        assert_eq!(err.to_string(), "age: error while generating text: boom");

        let err = ControlError::callback("colour", "db down".into());
        assert_eq!(err.to_string(), "colour: callback failed: db down");

        let err: ControlError = ChannelError::network("reset").into();
        assert_eq!(err.to_string(), "channel error: reset");

        let err: ControlError = LayoutError::NoButtons.into();
        assert_eq!(err.to_string(), "invalid button layout: no buttons to organize");
    }

    #[test]
    fn test_control_error_keeps_source() {
        use std::error::Error as _;
        let err = ControlError::values("colour", "no values".into());
        assert_eq!(err.source().map(ToString::to_string).as_deref(), Some("no values"));
    }

    #[test]
    fn test_form_error_display() {
        assert_eq!(FormError::Empty.to_string(), "creating form with no controllers");
        assert_eq!(
            FormError::DuplicateName("x".to_string()).to_string(),
            "controller x already exists"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidLanguage("??".to_string());
        assert_eq!(err.to_string(), "invalid language tag: \"??\"");
        let err: ConfigError = LayoutError::EmptyRow { row: 2 }.into();
        assert_eq!(
            err.to_string(),
            "invalid button pattern: pattern row 2 must hold at least one button"
        );
    }
}
