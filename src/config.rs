// src/config.rs
use std::env;
use std::fmt;

/// Telegram credentials, read once at startup.
#[derive(Clone, Default)]
pub struct Config {
    pub telegram_chat: String,
    pub telegram_token: String,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; missing keys become empty.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Config {
            telegram_chat: lookup(crate::ENV_CHAT).unwrap_or_default(),
            telegram_token: lookup(crate::ENV_TOKEN).unwrap_or_default(),
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        !self.telegram_chat.is_empty() && !self.telegram_token.is_empty()
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.telegram_token.is_empty() { "" } else { "<redacted>" };
        f.debug_struct("Config")
            .field("telegram_chat", &self.telegram_chat)
            .field("telegram_token", &token)
            .finish()
    }
}
