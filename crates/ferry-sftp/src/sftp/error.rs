//! SFTP-specific error type.

use ferry_core::remote::{RemoteError, RemoteErrorKind};
use serde::{Deserialize, Serialize};
use std::fmt;

/// SFTP status codes (draft-ietf-secsh-filexfer-02, section 7).
pub const SSH_FX_NO_SUCH_FILE: i32 = 2;
pub const SSH_FX_PERMISSION_DENIED: i32 = 3;
pub const SSH_FX_FAILURE: i32 = 4;

/// libssh2 session error for a refused `userauth_*` attempt.
const LIBSSH2_ERROR_AUTHENTICATION_FAILED: i32 = -18;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SftpError {
    pub kind: SftpErrorKind,
    pub message: String,
    /// SFTP status or libssh2 session code, if any.
    pub code: Option<i32>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum SftpErrorKind {
    NoSuchFile,
    PermissionDenied,
    /// Generic SFTP failure status (non-empty rmdir, existing target, …).
    Failure,
    /// Password rejected during user authentication.
    AuthFailed,
    /// TCP, handshake or channel failure.
    Connection,
}

pub type SftpResult<T> = Result<T, SftpError>;

impl SftpError {
    pub fn new(kind: SftpErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i32) -> Self {
        self.code = Some(code);
        self
    }

    pub fn no_such_file(path: &str) -> Self {
        Self::new(SftpErrorKind::NoSuchFile, format!("no such file: {}", path))
            .with_code(SSH_FX_NO_SUCH_FILE)
    }

    pub fn failure(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Failure, msg).with_code(SSH_FX_FAILURE)
    }

    pub fn auth_failed(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::AuthFailed, msg).with_code(LIBSSH2_ERROR_AUTHENTICATION_FAILED)
    }

    pub fn connection(msg: impl Into<String>) -> Self {
        Self::new(SftpErrorKind::Connection, msg)
    }

    /// Classify an SFTP status code.
    pub fn from_status(code: i32, msg: impl Into<String>) -> Self {
        let kind = match code {
            SSH_FX_NO_SUCH_FILE => SftpErrorKind::NoSuchFile,
            SSH_FX_PERMISSION_DENIED => SftpErrorKind::PermissionDenied,
            _ => SftpErrorKind::Failure,
        };
        Self::new(kind, msg).with_code(code)
    }

    pub fn is_not_found(&self) -> bool {
        self.kind == SftpErrorKind::NoSuchFile
    }

    /// The server answered with a status; the channel is still usable.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self.kind,
            SftpErrorKind::NoSuchFile | SftpErrorKind::PermissionDenied | SftpErrorKind::Failure
        )
    }
}

impl fmt::Display for SftpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "[SFTP {:?} {}] {}", self.kind, code, self.message)
        } else {
            write!(f, "[SFTP {:?}] {}", self.kind, self.message)
        }
    }
}

impl std::error::Error for SftpError {}

impl From<ssh2::Error> for SftpError {
    fn from(e: ssh2::Error) -> Self {
        match e.code() {
            ssh2::ErrorCode::SFTP(code) => Self::from_status(code, e.message()),
            ssh2::ErrorCode::Session(LIBSSH2_ERROR_AUTHENTICATION_FAILED) => {
                Self::auth_failed(e.message())
            }
            ssh2::ErrorCode::Session(code) => Self::connection(e.message()).with_code(code),
        }
    }
}

impl From<std::io::Error> for SftpError {
    fn from(e: std::io::Error) -> Self {
        Self::connection(format!("channel I/O: {}", e))
    }
}

impl From<SftpError> for RemoteError {
    fn from(e: SftpError) -> Self {
        let kind = match e.kind {
            SftpErrorKind::Connection => RemoteErrorKind::Transport,
            SftpErrorKind::PermissionDenied | SftpErrorKind::AuthFailed => {
                RemoteErrorKind::PermissionDenied
            }
            SftpErrorKind::NoSuchFile | SftpErrorKind::Failure => RemoteErrorKind::Protocol,
        };
        let mapped = RemoteError::new(kind, e.to_string());
        match e.code {
            Some(code) => mapped.with_code(i64::from(code)),
            None => mapped,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_classified() {
        assert!(SftpError::from_status(2, "gone").is_not_found());
        assert_eq!(SftpError::from_status(3, "no").kind, SftpErrorKind::PermissionDenied);
        assert_eq!(SftpError::from_status(4, "failed").kind, SftpErrorKind::Failure);
        assert_eq!(SftpError::from_status(8, "unsupported").kind, SftpErrorKind::Failure);
    }

    #[test]
    fn ssh2_session_errors_are_connection_or_auth() {
        let auth: SftpError =
            ssh2::Error::new(ssh2::ErrorCode::Session(-18), "Authentication failed").into();
        assert_eq!(auth.kind, SftpErrorKind::AuthFailed);

        let reset: SftpError =
            ssh2::Error::new(ssh2::ErrorCode::Session(-43), "socket recv").into();
        assert_eq!(reset.kind, SftpErrorKind::Connection);
        assert!(!reset.is_rejection());
    }

    #[test]
    fn converts_into_contract_error() {
        let err: RemoteError = SftpError::connection("eof").into();
        assert_eq!(err.kind, RemoteErrorKind::Transport);
        let err: RemoteError = SftpError::no_such_file("/x").into();
        assert_eq!(err.code, Some(2));
    }
}
