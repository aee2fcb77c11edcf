//! Credential store error type.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreErrorKind {
    /// Reading or writing the store file failed.
    Io,
    /// The file is not a JSON array of records.
    Parse,
    /// A stored password is not valid hex / UTF-8.
    Encoding,
    /// No platform configuration directory to put the default store in.
    NoConfigDir,
}

pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    pub fn new(kind: StoreErrorKind, msg: impl Into<String>) -> Self {
        Self {
            kind,
            message: msg.into(),
        }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Io, msg)
    }

    pub fn parse(msg: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Parse, msg)
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Encoding, msg)
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Credentials {:?}] {}", self.kind, self.message)
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        Self::io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        Self::parse(e.to_string())
    }
}
