// src/event.rs
use serde::Serialize;
use crate::line::RawLine;

/// An sshd "Accepted ..." login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionEvent {
    pub user: String,
    pub source_ip: String,
    pub auth_method: String,
    pub hostname: String,
    pub country: Option<String>,
}

/// A sudo invocation, successful or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrivilegeEvent {
    pub acting_user: String,
    pub target_user: String,
    pub command: String,
    pub hostname: String,
    pub succeeded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    Session(SessionEvent),
    Privilege(PrivilegeEvent),
}

/// Pick a grammar by unit and extract an event, if the message has one.
pub fn classify(raw: &RawLine<'_>) -> Option<Event> {
    if raw.unit.starts_with("sshd") {
        classify_ssh(raw.hostname, raw.message).map(Event::Session)
    } else if raw.unit.starts_with("sudo") {
        classify_sudo(raw.hostname, raw.message).map(Event::Privilege)
    } else {
        None
    }
}

/// `Accepted <method> for <user> from <ip> port <port> ssh2`
pub fn classify_ssh(hostname: &str, message: &str) -> Option<SessionEvent> {
    if !message.starts_with("Accepted") {
        return None;
    }

    let fields: Vec<&str> = message.split_whitespace().collect();
    if fields.len() < 6 {
        return None;
    }

    Some(SessionEvent {
        user: fields[3].to_string(),
        source_ip: fields[5].to_string(),
        auth_method: fields[1].to_string(),
        hostname: hostname.to_string(),
        country: None,
    })
}

/// `<user> : [N incorrect password attempts ;] TTY=.. ; PWD=.. ; USER=.. ; COMMAND=..`
pub fn classify_sudo(hostname: &str, message: &str) -> Option<PrivilegeEvent> {
    let (acting_user, rest) = message.trim().split_once(" : ")?;

    // Long commands are logged over several records; we don't stitch them.
    if rest.contains("(command continued)") {
        return None;
    }

    let succeeded = !rest.contains("incorrect password");

    let mut target_user = "";
    let mut command = "";
    for entry in rest.split(" ; ") {
        if let Some(v) = entry.strip_prefix("USER=") {
            target_user = v;
        } else if let Some(v) = entry.strip_prefix("COMMAND=") {
            command = v;
        }
    }

    Some(PrivilegeEvent {
        acting_user: acting_user.to_string(),
        target_user: target_user.to_string(),
        command: command.to_string(),
        hostname: hostname.to_string(),
        succeeded,
    })
}
