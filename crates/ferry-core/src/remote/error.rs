//! Error type surfaced by the connection contract.

use std::fmt;

/// Categorised contract error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteError {
    pub kind: RemoteErrorKind,
    pub message: String,
    /// Protocol status code that triggered the error, if any.
    pub code: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteErrorKind {
    /// Operation issued before `connect` succeeded.
    NotConnected,
    /// Lifecycle misuse: connecting twice, disconnecting twice, reuse after disconnect.
    InvalidState,
    /// Socket / session failure.
    Transport,
    /// The server answered with something the backend cannot interpret.
    Protocol,
    PermissionDenied,
    /// The backend has no equivalent for the requested operation.
    Unsupported,
    /// Reading or writing the local filesystem failed.
    LocalIo,
    InvalidInput,
}

pub type RemoteResult<T> = Result<T, RemoteError>;

// ── Construction helpers ─────────────────────────────────────────────

impl RemoteError {
    pub fn new(kind: RemoteErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    pub fn not_connected() -> Self {
        Self::new(RemoteErrorKind::NotConnected, "no active session")
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::InvalidState, msg)
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Transport, msg)
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Protocol, msg)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::PermissionDenied, msg)
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::Unsupported, msg)
    }

    pub fn local_io(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::LocalIo, msg)
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::InvalidInput, msg)
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind == RemoteErrorKind::Unsupported
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[{:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[{:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for RemoteError {}

impl From<std::io::Error> for RemoteError {
    fn from(e: std::io::Error) -> Self {
        Self::local_io(e.to_string())
    }
}
