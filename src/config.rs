//! Control configuration and injected services

use crate::channel::{Channel, Translator};
use crate::error::ConfigError;
use crate::layout::{DEFAULT_BUTTONS_PER_ROW, MAX_BUTTONS_PER_ROW};
use regex::Regex;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

/// Language used when the sender's language has no translation
pub const FALLBACK_LANG: &str = "en-US";

/// Delay before an input control re-prompts after a rejected reply
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

static LANGUAGE_TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z]{2,3}(-[A-Za-z0-9]{2,8})*$").expect("language tag regex is valid")
});

/// Checks that `tag` looks like a BCP 47 language tag (`en`, `en-US`, `pt-BR`).
pub fn validate_language(tag: &str) -> Result<(), ConfigError> {
    if LANGUAGE_TAG.is_match(tag) {
        Ok(())
    } else {
        Err(ConfigError::InvalidLanguage(tag.to_string()))
    }
}

/// Tunables shared by all controls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlsConfig {
    pub fallback_lang: String,
    pub retry_delay: Duration,
    pub max_buttons_per_row: usize,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            fallback_lang: FALLBACK_LANG.to_string(),
            retry_delay: DEFAULT_RETRY_DELAY,
            max_buttons_per_row: DEFAULT_BUTTONS_PER_ROW,
        }
    }
}

impl ControlsConfig {
    /// Load overrides from `CHATCTL_FALLBACK_LANG`, `CHATCTL_RETRY_DELAY_MS`
    /// and `CHATCTL_MAX_BUTTONS`. Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(lang) = lookup("CHATCTL_FALLBACK_LANG") {
            config.fallback_lang = lang;
        }
        if let Some(raw) = lookup("CHATCTL_RETRY_DELAY_MS") {
            let ms = parse_number("CHATCTL_RETRY_DELAY_MS", &raw)?;
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(raw) = lookup("CHATCTL_MAX_BUTTONS") {
            let n = parse_number("CHATCTL_MAX_BUTTONS", &raw)?;
            config.max_buttons_per_row = usize::try_from(n).map_err(|_| {
                ConfigError::InvalidNumber {
                    name: "CHATCTL_MAX_BUTTONS",
                    value: raw.clone(),
                }
            })?;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_language(&self.fallback_lang)?;
        if self.max_buttons_per_row == 0 || self.max_buttons_per_row > MAX_BUTTONS_PER_ROW {
            return Err(ConfigError::InvalidNumber {
                name: "max_buttons_per_row",
                value: self.max_buttons_per_row.to_string(),
            });
        }
        Ok(())
    }
}

fn parse_number(name: &'static str, raw: &str) -> Result<u64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::InvalidNumber {
        name,
        value: raw.to_string(),
    })
}

/// Capabilities injected into every control
#[derive(Clone)]
pub struct Services {
    pub channel: Arc<dyn Channel>,
    pub translator: Arc<dyn Translator>,
    pub config: ControlsConfig,
}

impl Services {
    pub fn new(channel: Arc<dyn Channel>, translator: Arc<dyn Translator>) -> Self {
        Self {
            channel,
            translator,
            config: ControlsConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ControlsConfig) -> Self {
        self.config = config;
        self
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
