//! Client error kinds and error value helpers.
//!
//! ```rust
//! use kclient::ClientError;
//!
//! let server = ClientError::server_status(503, "upstream unavailable");
//! assert!(server.retryable);
//! assert_eq!(server.status, Some(503));
//!
//! let rejected = ClientError::client_status(404, "not found");
//! assert!(!rejected.retryable);
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

use kcommon::Interruption;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientErrorKind {
    Configuration,
    Serialization,
    Transport,
    Timeout,
    ServerStatus,
    ClientStatus,
    Decode,
    Cancelled,
    DeadlineExceeded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError {
    pub kind: ClientErrorKind,
    pub message: String,
    pub retryable: bool,
    pub status: Option<u16>,
}

impl ClientError {
    pub fn new(kind: ClientErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
            status: None,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Configuration, message, false)
    }

    pub fn serialization(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Serialization, message, false)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Transport, message, true)
    }

    /// Per-attempt transport timeout. Retryable, unlike a caller deadline.
    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Timeout, message, true)
    }

    pub fn server_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::ServerStatus, message, true).with_status(status)
    }

    pub fn client_status(status: u16, message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::ClientStatus, message, false).with_status(status)
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Decode, message, false)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::Cancelled, message, false)
    }

    pub fn deadline_exceeded(message: impl Into<String>) -> Self {
        Self::new(ClientErrorKind::DeadlineExceeded, message, false)
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_context(mut self, context: impl Display) -> Self {
        self.message = format!("{context}: {}", self.message);
        self
    }

    pub fn is_interruption(&self) -> bool {
        matches!(
            self.kind,
            ClientErrorKind::Cancelled | ClientErrorKind::DeadlineExceeded
        )
    }
}

impl Display for ClientError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ClientError {}

impl From<Interruption> for ClientError {
    fn from(value: Interruption) -> Self {
        match value {
            Interruption::Cancelled => Self::cancelled(value.to_string()),
            Interruption::DeadlineExceeded => Self::deadline_exceeded(value.to_string()),
        }
    }
}
