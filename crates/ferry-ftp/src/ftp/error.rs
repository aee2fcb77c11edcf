//! FTP-specific error type.

use ferry_core::remote::{RemoteError, RemoteErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorised FTP error.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FtpError {
    pub kind: FtpErrorKind,
    pub message: String,
    /// FTP reply code that triggered the error, if any.
    pub code: Option<u32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum FtpErrorKind {
    /// TCP / DNS resolution failure.
    ConnectionFailed,
    /// Wrong username/password (530).
    AuthFailed,
    /// File or directory unavailable (450 / 550).
    Unavailable,
    /// File name not allowed (553).
    NameNotAllowed,
    /// Any other 4xx/5xx reply.
    CommandRejected,
    /// Server closed the control connection (421) or the session is gone.
    Disconnected,
    /// Server sent an un-parseable response.
    ProtocolError,
    /// An I/O error on the local side (file read/write).
    IoError,
}

pub type FtpResult<T> = Result<T, FtpError>;

// ── Construction helpers ─────────────────────────────────────────────

impl FtpError {
    pub fn new(kind: FtpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: u32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn connection_failed(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ConnectionFailed, msg)
    }

    pub fn disconnected(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::Disconnected, msg)
    }

    pub fn protocol_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::ProtocolError, msg)
    }

    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(FtpErrorKind::IoError, msg)
    }

    /// Classify an FTP reply code into the most appropriate error kind.
    pub fn from_reply(code: u32, text: &str) -> Self {
        let kind = match code {
            421 => FtpErrorKind::Disconnected,
            430 | 530 => FtpErrorKind::AuthFailed,
            450 | 550 => FtpErrorKind::Unavailable,
            553 => FtpErrorKind::NameNotAllowed,
            _ if code >= 400 => FtpErrorKind::CommandRejected,
            _ => FtpErrorKind::ProtocolError,
        };
        Self {
            kind,
            message: text.to_string(),
            code: Some(code),
        }
    }

    /// The 550-style "no such file or directory" answer.
    pub fn is_unavailable(&self) -> bool {
        self.kind == FtpErrorKind::Unavailable
    }

    /// The server understood and refused the command; the session is intact.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind,
            FtpErrorKind::Unavailable | FtpErrorKind::NameNotAllowed | FtpErrorKind::CommandRejected
        )
    }
}

impl fmt::Display for FtpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[FTP {:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[FTP {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for FtpError {}

impl From<std::io::Error> for FtpError {
    fn from(e: std::io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<FtpError> for RemoteError {
    fn from(e: FtpError) -> Self {
        let kind = match e.kind {
            FtpErrorKind::ConnectionFailed | FtpErrorKind::Disconnected => {
                RemoteErrorKind::Transport
            }
            FtpErrorKind::AuthFailed => RemoteErrorKind::PermissionDenied,
            FtpErrorKind::IoError => RemoteErrorKind::LocalIo,
            FtpErrorKind::Unavailable
            | FtpErrorKind::NameNotAllowed
            | FtpErrorKind::CommandRejected
            | FtpErrorKind::ProtocolError => RemoteErrorKind::Protocol,
        };
        let mapped = RemoteError::new(kind, e.to_string());
        match e.code {
            Some(code) => mapped.with_code(i64::from(code)),
            None => mapped,
        }
    }
}
