//! Settings for the FTP backend.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-backend connection settings, filled in by the connection factory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FtpSettings {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// Passive (PASV) data connections; active mode otherwise.
    #[serde(default = "default_true")]
    pub passive: bool,
}

fn default_port() -> u16 {
    21
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

impl Default for FtpSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_sec: default_connect_timeout(),
            passive: true,
        }
    }
}

impl FtpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_sec)
    }
}
