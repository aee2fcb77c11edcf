// ── SFTP settings and attribute snapshot ─────────────────────────────────────

use chrono::{DateTime, Utc};
use ferry_core::remote::EntryKind;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SftpSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
}

fn default_port() -> u16 {
    22
}

fn default_connect_timeout() -> u64 {
    15
}

impl Default for SftpSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_sec: default_connect_timeout(),
        }
    }
}

impl SftpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }
}

/// What a `stat` / `readdir` reports for one path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SftpAttributes {
    pub kind: EntryKind,
    pub size: u64,
    pub modified: Option<DateTime<Utc>>,
    /// Permission bits without the file-type bits.
    pub perm: Option<u32>,
}

impl SftpAttributes {
    /// Build from a raw `st_mode`, splitting the type bits off the permission bits.
    pub fn from_mode(mode: Option<u32>, size: Option<u64>, mtime: Option<u64>) -> Self {
        let kind = match mode.map(|m| m & 0o170000) {
            Some(0o040000) => EntryKind::Directory,
            Some(0o100000) => EntryKind::File,
            Some(0o120000) => EntryKind::Symlink,
            _ => EntryKind::Other,
        };
        Self {
            kind,
            size: size.unwrap_or(0),
            modified: mtime
                .and_then(|s| i64::try_from(s).ok())
                .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0)),
            perm: mode.map(|m| m & 0o7777),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }
}
