//! Connection configuration.
//!
//! The protocol is resolved here, once, into the closed `Protocol` set;
//! everything downstream dispatches on the enum.

use ferry_core::remote::{Protocol, RemoteError, RemoteResult};
use ferry_credentials::credentials::CredentialRecord;
use ferry_ftp::ftp::FtpSettings;
use ferry_sftp::sftp::SftpSettings;
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// `"ftp"` / `"sftp"`, case-insensitive.
    #[serde(deserialize_with = "protocol_from_name")]
    pub protocol: Protocol,
    pub host: String,
    /// Defaults to the protocol's well-known port.
    #[serde(default)]
    pub port: Option<u16>,
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_sec: u64,
    /// FTP only: passive data connections.
    #[serde(default = "default_true")]
    pub passive: bool,
}

fn default_connect_timeout() -> u64 {
    15
}

fn default_true() -> bool {
    true
}

fn protocol_from_name<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Protocol, D::Error> {
    let name = String::deserialize(deserializer)?;
    name.parse::<Protocol>().map_err(serde::de::Error::custom)
}

impl ConnectionConfig {
    pub fn new(protocol: Protocol, host: &str, username: &str, password: &str) -> Self {
        Self {
            protocol,
            host: host.to_string(),
            port: None,
            username: username.to_string(),
            password: password.to_string(),
            connect_timeout_sec: default_connect_timeout(),
            passive: true,
        }
    }

    pub fn from_json_str(json: &str) -> RemoteResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| RemoteError::invalid_input(format!("invalid connection config: {}", e)))
    }

    /// Rebuild a config from a saved credential record.
    pub fn from_record(record: &CredentialRecord) -> RemoteResult<Self> {
        let protocol = record.protocol.parse::<Protocol>()?;
        let password = record
            .plain_password()
            .map_err(|e| RemoteError::invalid_input(e.to_string()))?;
        Ok(Self::new(protocol, &record.host, &record.username, &password))
    }

    /// Inverse of `from_record`; the password is obfuscated.
    pub fn to_record(&self) -> CredentialRecord {
        CredentialRecord::new(&self.username, &self.password, &self.host, self.protocol.as_str())
    }

    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.protocol.default_port())
    }

    pub fn ftp_settings(&self) -> FtpSettings {
        FtpSettings {
            port: self.effective_port(),
            connect_timeout_sec: self.connect_timeout_sec,
            passive: self.passive,
        }
    }

    pub fn sftp_settings(&self) -> SftpSettings {
        SftpSettings {
            port: self.effective_port(),
            connect_timeout_sec: self.connect_timeout_sec,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::remote::RemoteErrorKind;

    #[test]
    fn defaults_fill_in() {
        let cfg = ConnectionConfig::from_json_str(
            r#"{"protocol": "SFTP", "host": "files.example.com", "username": "ops"}"#,
        )
        .unwrap();
        assert_eq!(cfg.protocol, Protocol::Sftp);
        assert_eq!(cfg.effective_port(), 22);
        assert_eq!(cfg.connect_timeout_sec, 15);
        assert!(cfg.passive);
        assert_eq!(cfg.password, "");
    }

    #[test]
    fn explicit_port_wins() {
        let cfg = ConnectionConfig::from_json_str(
            r#"{"protocol": "ftp", "host": "h", "port": 2121, "username": "u", "passive": false}"#,
        )
        .unwrap();
        let ftp = cfg.ftp_settings();
        assert_eq!(ftp.port, 2121);
        assert!(!ftp.passive);
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let err = ConnectionConfig::from_json_str(
            r#"{"protocol": "scp", "host": "h", "username": "u"}"#,
        )
        .unwrap_err();
        assert_eq!(err.kind, RemoteErrorKind::InvalidInput);
    }

    #[test]
    fn credential_records_round_trip() {
        let cfg = ConnectionConfig::new(Protocol::Ftp, "ftp.example.com", "alice", "s3cret");
        let record = cfg.to_record();
        assert_eq!(record.protocol, "FTP");
        assert_ne!(record.password, "s3cret");
        assert_eq!(ConnectionConfig::from_record(&record).unwrap(), cfg);
    }
}
