//! Typed errors for the collaborators the dashboard talks to.
//!
//! None of these are fatal: the IPC layer turns them into `{code, message}`
//! responses and the dashboard keeps running.

use thiserror::Error;

/// Failure reported by the authentication service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("the email address is badly formatted")]
    InvalidEmail,

    #[error("a password is required")]
    MissingPassword,

    /// Unknown account and wrong password share one message.
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("network error: {0}")]
    Network(String),
}

impl AuthError {
    /// Stable machine-readable kind, surfaced as `error.details.kind`.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::InvalidEmail => "invalidEmail",
            AuthError::MissingPassword => "missingPassword",
            AuthError::InvalidCredentials => "invalidCredentials",
            AuthError::Network(_) => "network",
        }
    }
}

/// Failure addressing the realtime store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("invalid store key {key:?}: {reason}")]
    InvalidKey { key: String, reason: &'static str },
}

/// Rejected manual subject selection.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("sign in before selecting a subject")]
    NotSignedIn,

    #[error("unknown subject: {0}")]
    UnknownSubject(String),
}
