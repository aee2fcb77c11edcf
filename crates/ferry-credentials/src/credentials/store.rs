// ── Flat JSON credential store ──────────────────────────────────────────────

use crate::credentials::error::{StoreError, StoreErrorKind, StoreResult};
use crate::credentials::obfuscation;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One saved login. `password` is always stored obfuscated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CredentialRecord {
    #[serde(rename = "userName")]
    pub username: String,
    pub password: String,
    #[serde(rename = "server")]
    pub host: String,
    pub protocol: String,
}

impl CredentialRecord {
    /// Build a record from a plain-text password.
    pub fn new(username: &str, plain_password: &str, host: &str, protocol: &str) -> Self {
        Self {
            username: username.to_string(),
            password: obfuscation::obfuscate(plain_password),
            host: host.to_string(),
            protocol: protocol.to_string(),
        }
    }

    pub fn plain_password(&self) -> StoreResult<String> {
        obfuscation::reveal(&self.password)
    }
}

/// Ordered record list backed by one JSON file.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
    records: Vec<CredentialRecord>,
}

impl CredentialStore {
    /// `<config dir>/ferry/credentials.json`.
    pub fn default_path() -> StoreResult<PathBuf> {
        dirs::config_dir()
            .map(|d| d.join("ferry").join("credentials.json"))
            .ok_or_else(|| {
                StoreError::new(
                    StoreErrorKind::NoConfigDir,
                    "no configuration directory on this platform",
                )
            })
    }

    pub fn open_default() -> StoreResult<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Read the store at `path`. A missing or empty file is an empty store.
    pub fn load(path: &Path) -> StoreResult<Self> {
        let records = match fs::read_to_string(path) {
            Ok(text) if text.trim().is_empty() => Vec::new(),
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No credential store at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: path.to_path_buf(),
            records,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn records(&self) -> &[CredentialRecord] {
        &self.records
    }

    pub fn find(&self, username: &str) -> Option<&CredentialRecord> {
        self.records.iter().find(|r| r.username == username)
    }

    /// Append and persist `record` unless its username is already stored.
    pub fn append(&mut self, record: CredentialRecord) -> StoreResult<bool> {
        if self.find(&record.username).is_some() {
            debug!("Credentials for '{}' already stored", record.username);
            return Ok(false);
        }
        let username = record.username.clone();
        self.records.push(record);
        if let Err(e) = self.save() {
            self.records.pop();
            return Err(e);
        }
        info!("Stored credentials for '{}' in {}", username, self.path.display());
        Ok(true)
    }

    /// Write through a sibling temp file so a crash never leaves half a store.
    fn save(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.records)?;
        let staging = self.path.with_extension("json.tmp");
        fs::write(&staging, json)?;
        fs::rename(&staging, &self.path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let store = CredentialStore::load(&dir.path().join("none.json")).unwrap();
        assert!(store.records().is_empty());
    }

    #[test]
    fn append_only_adds_new_usernames() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("credentials.json");
        let mut store = CredentialStore::load(&path).unwrap();

        let alice = CredentialRecord::new("alice", "pw1", "ftp.example.com", "FTP");
        assert!(store.append(alice).unwrap());
        let alice_again = CredentialRecord::new("alice", "other", "sftp.example.com", "SFTP");
        assert!(!store.append(alice_again).unwrap());
        let bob = CredentialRecord::new("bob", "pw2", "sftp.example.com", "SFTP");
        assert!(store.append(bob).unwrap());

        let reloaded = CredentialStore::load(&path).unwrap();
        assert_eq!(reloaded.records().len(), 2);
        assert_eq!(reloaded.records()[0].username, "alice");
        let alice = reloaded.find("alice").unwrap();
        assert_eq!(alice.host, "ftp.example.com");
        assert_eq!(alice.plain_password().unwrap(), "pw1");
        assert!(reloaded.find("carol").is_none());
    }

    #[test]
    fn file_uses_the_flat_record_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        let mut store = CredentialStore::load(&path).unwrap();
        store.append(CredentialRecord::new("u", "ab", "h", "SFTP")).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            raw,
            serde_json::json!([
                { "userName": "u", "password": "6162", "server": "h", "protocol": "SFTP" }
            ])
        );
        assert!(!dir.path().join("credentials.json.tmp").exists());
    }

    #[test]
    fn corrupt_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("credentials.json");
        fs::write(&path, "{not json").unwrap();
        assert_eq!(CredentialStore::load(&path).unwrap_err().kind, StoreErrorKind::Parse);
    }
}
