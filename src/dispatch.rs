// src/dispatch.rs
use tracing::{debug, error, info};
use crate::event::{Event, PrivilegeEvent, SessionEvent};
use crate::notify::Notifier;

impl Event {
    /// One-line console text.
    pub fn summary(&self) -> String {
        match self {
            Event::Session(SessionEvent { user, source_ip, auth_method, country: None, .. }) => {
                format!("new ssh session for user {user} (from {source_ip}; using {auth_method})")
            }
            Event::Session(SessionEvent { user, source_ip, auth_method, country: Some(country), .. }) => {
                format!("new ssh session for user {user} (from {source_ip}; using {auth_method}; country {country})")
            }
            Event::Privilege(PrivilegeEvent { acting_user, target_user, command, succeeded: true, .. }) => {
                format!("sudo executed by {acting_user} (became {target_user}; for command {command})")
            }
            Event::Privilege(PrivilegeEvent { acting_user, target_user, command, succeeded: false, .. }) => {
                format!("failed attempt to execute sudo by {acting_user} (to become {target_user}; for command {command})")
            }
        }
    }

    /// Multi-line notification text.
    pub fn notification_body(&self) -> String {
        match self {
            Event::Session(SessionEvent { user, source_ip, auth_method, hostname, country: None }) => {
                format!(
                    "new ssh session started by user {user}\n\nfrom: {source_ip}\nmethod: {auth_method}\nhostname: {hostname}"
                )
            }
            Event::Session(SessionEvent { user, source_ip, auth_method, hostname, country: Some(country) }) => {
                format!(
                    "new ssh session started by user {user}\n\nfrom: {source_ip}\nmethod: {auth_method}\nhostname: {hostname}\ncountry: {country}\n"
                )
            }
            Event::Privilege(PrivilegeEvent { acting_user, target_user, command, hostname, succeeded: true }) => {
                format!("sudo started by {acting_user}\n\ntarget: {target_user}\ncommand: {command}\nhostname: {hostname}")
            }
            Event::Privilege(PrivilegeEvent { acting_user, target_user, command, hostname, succeeded: false }) => {
                format!(
                    "failed attempt to start sudo by {acting_user}\n\ntarget: {target_user}\ncommand: {command}\nhostname: {hostname}"
                )
            }
        }
    }
}

/// Log the event and push it to the notifier. Send failures are logged only.
pub fn dispatch(event: &Event, notifier: &dyn Notifier) {
    info!("{}", event.summary());
    if let Ok(json) = serde_json::to_string(event) {
        debug!(event = %json, "dispatching");
    }

    if let Err(e) = notifier.send(&event.notification_body()) {
        error!("could not send message: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use crate::notify::NotifyError;

    struct Recorder(RefCell<Vec<String>>);

    impl Notifier for Recorder {
        fn send(&self, body: &str) -> Result<(), NotifyError> {
            self.0.borrow_mut().push(body.to_string());
            Ok(())
        }
    }

    struct Broken(RefCell<usize>);

    impl Notifier for Broken {
        fn send(&self, _body: &str) -> Result<(), NotifyError> {
            *self.0.borrow_mut() += 1;
            Err(NotifyError::Api("Unauthorized".into()))
        }
    }

    fn session(country: Option<&str>) -> Event {
        Event::Session(SessionEvent {
            user: "alice".into(),
            source_ip: "10.0.0.5".into(),
            auth_method: "publickey".into(),
            hostname: "web01".into(),
            country: country.map(String::from),
        })
    }

    fn sudo(succeeded: bool) -> Event {
        Event::Privilege(PrivilegeEvent {
            acting_user: "bob".into(),
            target_user: "root".into(),
            command: "/bin/ls".into(),
            hostname: "web01".into(),
            succeeded,
        })
    }

    #[test]
    fn session_templates() {
        assert_eq!(session(None).summary(), "new ssh session for user alice (from 10.0.0.5; using publickey)");
        assert_eq!(
            session(None).notification_body(),
            "new ssh session started by user alice\n\nfrom: 10.0.0.5\nmethod: publickey\nhostname: web01"
        );
        assert_eq!(
            session(Some("US, United States")).summary(),
            "new ssh session for user alice (from 10.0.0.5; using publickey; country US, United States)"
        );
        assert_eq!(
            session(Some("US, United States")).notification_body(),
            "new ssh session started by user alice\n\nfrom: 10.0.0.5\nmethod: publickey\nhostname: web01\ncountry: US, United States\n"
        );
    }

    #[test]
    fn sudo_templates() {
        assert_eq!(sudo(true).summary(), "sudo executed by bob (became root; for command /bin/ls)");
        assert_eq!(
            sudo(true).notification_body(),
            "sudo started by bob\n\ntarget: root\ncommand: /bin/ls\nhostname: web01"
        );
        assert_eq!(
            sudo(false).summary(),
            "failed attempt to execute sudo by bob (to become root; for command /bin/ls)"
        );
        assert_eq!(
            sudo(false).notification_body(),
            "failed attempt to start sudo by bob\n\ntarget: root\ncommand: /bin/ls\nhostname: web01"
        );
    }

    #[test]
    fn dispatch_sends_body() {
        let rec = Recorder(RefCell::new(Vec::new()));
        dispatch(&sudo(true), &rec);
        assert_eq!(rec.0.into_inner(), vec![sudo(true).notification_body()]);
    }

    #[test]
    fn dispatch_swallows_send_failure() {
        let broken = Broken(RefCell::new(0));
        dispatch(&session(None), &broken);
        dispatch(&sudo(false), &broken);
        assert_eq!(broken.0.into_inner(), 2);
    }
}
