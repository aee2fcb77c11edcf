//! Shared types for the remote module.

use crate::remote::error::{RemoteError, RemoteErrorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ─── Protocol ────────────────────────────────────────────────────────

/// The closed set of supported backends.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Ftp,
    Sftp,
}

impl Protocol {
    /// Well-known control port for the protocol.
    pub fn default_port(self) -> u16 {
        match self {
            Self::Ftp => 21,
            Self::Sftp => 22,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ftp => "FTP",
            Self::Sftp => "SFTP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = RemoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ftp" => Ok(Self::Ftp),
            "sftp" => Ok(Self::Sftp),
            other => Err(RemoteError::new(
                RemoteErrorKind::InvalidInput,
                format!("unknown protocol '{}' (expected FTP or SFTP)", other),
            )),
        }
    }
}

// ─── Directory entries ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
    Other,
}

/// One child of a remote directory, produced transiently by listings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RemoteEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
}

impl RemoteEntry {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// `.` and `..` pseudo-entries some servers include in listings.
    pub fn is_pseudo(&self) -> bool {
        self.name == "." || self.name == ".."
    }
}

// ─── Session lifecycle ───────────────────────────────────────────────

/// Result of a connection attempt.
///
/// Kept separate from `RemoteError` so a caller can tell "try another
/// password" apart from "the server is unreachable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectOutcome {
    Authenticated,
    RejectedCredentials,
    TransportFailure { reason: String },
}

impl ConnectOutcome {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated)
    }
}

/// `Unconnected → Connected → Disconnected`; `Disconnected` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    #[default]
    Unconnected,
    Connected,
    Disconnected,
}

// ─── Batch transfers ─────────────────────────────────────────────────

/// What happened to a single path inside a multi-file transfer.
#[derive(Debug, Clone)]
pub enum ItemOutcome {
    Transferred,
    /// Validation refused the item (missing local file, missing remote
    /// directory, unreachable remote file). Nothing was transferred.
    Rejected,
    Failed(RemoteError),
}

#[derive(Debug, Clone)]
pub struct BatchItem {
    pub path: String,
    pub outcome: ItemOutcome,
}

/// Per-item result of `upload_multiple_files` / `download_multiple_files`.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn push(&mut self, path: impl Into<String>, outcome: ItemOutcome) {
        self.items.push(BatchItem {
            path: path.into(),
            outcome,
        });
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn succeeded(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i.outcome, ItemOutcome::Transferred))
            .count()
    }

    /// Paths that were rejected or failed, in input order.
    pub fn unsuccessful(&self) -> Vec<&str> {
        self.items
            .iter()
            .filter(|i| !matches!(i.outcome, ItemOutcome::Transferred))
            .map(|i| i.path.as_str())
            .collect()
    }

    pub fn all_succeeded(&self) -> bool {
        self.succeeded() == self.total()
    }
}

// ─── Directory sync ──────────────────────────────────────────────────

/// Counters collected while mirroring a directory tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncSummary {
    pub files_transferred: usize,
    /// Files left alone because the local copy was not older.
    pub files_skipped: usize,
    pub directories_created: usize,
    /// Files the backend refused to transfer.
    pub failed: Vec<PathBuf>,
}

impl SyncSummary {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
