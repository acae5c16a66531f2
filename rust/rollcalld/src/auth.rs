//! Authentication collaborator.
//!
//! [`LocalAuth`] checks credentials against configured accounts. Watchers get
//! the current state once on registration and every change after that.

use crate::config::Account;
use crate::error::AuthError;
use log::info;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::mpsc::{channel, Receiver, Sender};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub uid: String,
    pub email: String,
    /// Fresh per sign-in; only used to correlate log lines.
    pub session_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthEvent {
    SignedIn(Identity),
    SignedOut,
}

pub trait AuthService {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError>;
    fn sign_out(&mut self);
    fn current(&self) -> Option<&Identity>;
    fn watch(&mut self) -> Receiver<AuthEvent>;
}

pub fn password_digest(password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct LocalAuth {
    accounts: Vec<Account>,
    current: Option<Identity>,
    reachable: bool,
    watchers: Vec<Sender<AuthEvent>>,
}

impl LocalAuth {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            accounts,
            current: None,
            reachable: true,
            watchers: Vec::new(),
        }
    }

    pub fn set_reachable(&mut self, reachable: bool) {
        self.reachable = reachable;
    }

    fn current_event(&self) -> AuthEvent {
        match &self.current {
            Some(identity) => AuthEvent::SignedIn(identity.clone()),
            None => AuthEvent::SignedOut,
        }
    }

    fn notify(&mut self) {
        let event = self.current_event();
        self.watchers.retain(|w| w.send(event.clone()).is_ok());
    }
}

impl AuthService for LocalAuth {
    fn sign_in(&mut self, email: &str, password: &str) -> Result<Identity, AuthError> {
        let email = email.trim();
        if !email.contains('@') {
            return Err(AuthError::InvalidEmail);
        }
        if password.is_empty() {
            return Err(AuthError::MissingPassword);
        }
        if !self.reachable {
            return Err(AuthError::Network("authentication backend unreachable".to_string()));
        }

        let digest = password_digest(password);
        let account = self
            .accounts
            .iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
            .filter(|a| a.password_sha256.trim().eq_ignore_ascii_case(&digest))
            .ok_or(AuthError::InvalidCredentials)?;

        let identity = Identity {
            uid: account
                .uid
                .clone()
                .unwrap_or_else(|| account.email.to_ascii_lowercase()),
            email: account.email.clone(),
            session_id: Uuid::new_v4().to_string(),
        };
        info!(
            "event=sign_in status=ok email={} session={}",
            identity.email, identity.session_id
        );
        self.current = Some(identity.clone());
        self.notify();
        Ok(identity)
    }

    fn sign_out(&mut self) {
        if let Some(identity) = self.current.take() {
            info!(
                "event=sign_out email={} session={}",
                identity.email, identity.session_id
            );
            self.notify();
        }
    }

    fn current(&self) -> Option<&Identity> {
        self.current.as_ref()
    }

    fn watch(&mut self) -> Receiver<AuthEvent> {
        let (tx, rx) = channel();
        let _ = tx.send(self.current_event());
        self.watchers.push(tx);
        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn auth() -> LocalAuth {
        LocalAuth::new(vec![Account {
            email: "teacher@school.test".to_string(),
            password_sha256: password_digest("hunter2"),
            uid: Some("t-1".to_string()),
        }])
    }

    #[test]
    fn watch_emits_current_state_on_registration() {
        let mut auth = auth();
        let rx = auth.watch();
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![AuthEvent::SignedOut]);
    }

    #[test]
    fn sign_in_and_out_notify_watchers() {
        let mut auth = auth();
        let rx = auth.watch();
        let _ = rx.try_recv();

        let identity = auth
            .sign_in("  Teacher@School.test ", "hunter2")
            .expect("sign in");
        assert_eq!(identity.uid, "t-1");
        assert_eq!(auth.current(), Some(&identity));

        auth.sign_out();
        auth.sign_out();
        let events: Vec<AuthEvent> = rx.try_iter().collect();
        assert_eq!(events, vec![AuthEvent::SignedIn(identity), AuthEvent::SignedOut]);
    }

    #[test]
    fn each_sign_in_gets_a_fresh_session_id() {
        let mut auth = auth();
        let a = auth.sign_in("teacher@school.test", "hunter2").expect("first");
        let b = auth.sign_in("teacher@school.test", "hunter2").expect("second");
        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn rejects_bad_input_and_credentials() {
        let mut auth = auth();
        assert_eq!(auth.sign_in("nobody", "x"), Err(AuthError::InvalidEmail));
        assert_eq!(auth.sign_in("teacher@school.test", ""), Err(AuthError::MissingPassword));
        assert_eq!(
            auth.sign_in("teacher@school.test", "wrong"),
            Err(AuthError::InvalidCredentials)
        );
        assert_eq!(
            auth.sign_in("other@school.test", "hunter2"),
            Err(AuthError::InvalidCredentials)
        );
        assert!(auth.current().is_none());
    }

    #[test]
    fn unreachable_backend_is_a_network_error() {
        let mut auth = auth();
        auth.set_reachable(false);
        let err = auth.sign_in("teacher@school.test", "hunter2").unwrap_err();
        assert_eq!(err.kind(), "network");
    }
}
