//! Connection factory: `Protocol` → boxed `RemoteConnection`.

use crate::config::ConnectionConfig;
use ferry_core::remote::{ConnectOutcome, Protocol, RemoteConnection, RemoteResult};
use ferry_ftp::ftp::{FtpConnection, FtpDialer, FtpSettings, SuppaFtpDialer};
use ferry_sftp::sftp::{SftpConnection, SftpDialer, SftpSettings, Ssh2Dialer};
use log::debug;

/// Builds unconnected backends. The dialers decide how sockets are opened;
/// the defaults use `suppaftp` and `ssh2`.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFactory<F = SuppaFtpDialer, S = Ssh2Dialer> {
    ftp: F,
    sftp: S,
}

impl ConnectionFactory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F, S> ConnectionFactory<F, S>
where
    F: FtpDialer + Clone + 'static,
    F::Transport: 'static,
    S: SftpDialer + Clone + 'static,
    S::Transport: 'static,
{
    pub fn with_dialers(ftp: F, sftp: S) -> Self {
        Self { ftp, sftp }
    }

    /// A backend for `protocol` with default settings.
    pub fn create(&self, protocol: Protocol) -> Box<dyn RemoteConnection> {
        match protocol {
            Protocol::Ftp => Box::new(FtpConnection::new(self.ftp.clone(), FtpSettings::default())),
            Protocol::Sftp => {
                Box::new(SftpConnection::new(self.sftp.clone(), SftpSettings::default()))
            }
        }
    }

    /// Resolve a protocol name (`"FTP"`, `"sftp"`, …) then `create`.
    pub fn create_named(&self, name: &str) -> RemoteResult<Box<dyn RemoteConnection>> {
        Ok(self.create(name.parse::<Protocol>()?))
    }

    /// A backend carrying the port, timeout and mode from `config`.
    pub fn from_config(&self, config: &ConnectionConfig) -> Box<dyn RemoteConnection> {
        debug!(
            "Building {} backend for {}:{}",
            config.protocol,
            config.host,
            config.effective_port()
        );
        match config.protocol {
            Protocol::Ftp => Box::new(FtpConnection::new(self.ftp.clone(), config.ftp_settings())),
            Protocol::Sftp => {
                Box::new(SftpConnection::new(self.sftp.clone(), config.sftp_settings()))
            }
        }
    }

    /// `from_config` followed by `connect` with the configured credentials.
    pub fn open(
        &self,
        config: &ConnectionConfig,
    ) -> RemoteResult<(Box<dyn RemoteConnection>, ConnectOutcome)> {
        let mut conn = self.from_config(config);
        let outcome = conn.connect(&config.host, &config.username, &config.password)?;
        Ok((conn, outcome))
    }
}
