// src/notify.rs
use std::fmt;
use std::io;
use std::time::Duration;
use serde::Deserialize;
use crate::config::Config;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Transport(#[from] Box<ureq::Transport>),
    #[error("cannot read response: {0}")]
    Io(#[from] io::Error),
    #[error("cannot decode response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("telegram returned an error: {0}")]
    Api(String),
}

/// Where rendered notifications go.
pub trait Notifier {
    fn send(&self, body: &str) -> Result<(), NotifyError>;
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: String,
}

/// Telegram Bot API `sendMessage` client.
pub struct TelegramNotifier {
    api: String,
    chat: String,
    token: String,
    agent: ureq::Agent,
}

impl TelegramNotifier {
    /// `api` is the Bot API base URL, without a trailing slash.
    pub fn new(
        api: impl Into<String>,
        chat: impl Into<String>,
        token: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { api: api.into(), chat: chat.into(), token: token.into(), agent }
    }

    pub fn from_config(cfg: &Config, timeout: Duration) -> Self {
        Self::new(crate::TELEGRAM_API, cfg.telegram_chat.clone(), cfg.telegram_token.clone(), timeout)
    }

    pub fn is_enabled(&self) -> bool {
        !self.chat.is_empty() && !self.token.is_empty()
    }
}

impl fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api", &self.api)
            .field("chat", &self.chat)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl Notifier for TelegramNotifier {
    fn send(&self, body: &str) -> Result<(), NotifyError> {
        // No credentials: notifications are optional.
        if !self.is_enabled() {
            return Ok(());
        }

        let endpoint = format!("{}/bot{}/sendMessage", self.api, self.token);
        let response = match self
            .agent
            .get(&endpoint)
            .query("chat_id", &self.chat)
            .query("text", body)
            .call()
        {
            Ok(resp) => resp,
            // Telegram reports failures as 4xx with the usual JSON body.
            Err(ureq::Error::Status(_, resp)) => resp,
            Err(ureq::Error::Transport(t)) => return Err(Box::new(t).into()),
        };

        check_response(&response.into_string()?)
    }
}

/// Interpret a `sendMessage` reply body.
fn check_response(data: &str) -> Result<(), NotifyError> {
    let resp: TelegramResponse = serde_json::from_str(data)?;
    if !resp.ok {
        return Err(NotifyError::Api(resp.description));
    }
    Ok(())
}
