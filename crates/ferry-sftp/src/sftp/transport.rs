//! Primitive SFTP transport.
//!
//! `SftpTransport` is the stat/exception channel the backend needs: every
//! path query returns attributes or a typed status error. The production
//! implementation is an `ssh2` session plus its SFTP subsystem.

use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::types::{SftpAttributes, SftpSettings};
use ferry_core::remote::EntryKind;
use log::debug;
use ssh2::{FileStat, RenameFlags, Session, Sftp};
use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;

pub trait SftpTransport {
    /// Password authentication, then open the SFTP subsystem.
    fn authenticate(&mut self, username: &str, password: &str) -> SftpResult<()>;

    /// Absolute path of the login directory.
    fn home(&mut self) -> SftpResult<String>;

    fn stat(&mut self, path: &str) -> SftpResult<SftpAttributes>;

    /// Children of `path` as `(name, attributes)`, in server order.
    fn readdir(&mut self, path: &str) -> SftpResult<Vec<(String, SftpAttributes)>>;

    fn mkdir(&mut self, path: &str, mode: u32) -> SftpResult<()>;

    fn rmdir(&mut self, path: &str) -> SftpResult<()>;

    fn unlink(&mut self, path: &str) -> SftpResult<()>;

    /// Rename without overwriting an existing target.
    fn rename(&mut self, from: &str, to: &str) -> SftpResult<()>;

    fn read_file(&mut self, path: &str) -> SftpResult<Vec<u8>>;

    fn write_file(&mut self, path: &str, reader: &mut dyn Read) -> SftpResult<u64>;

    /// `setstat` carrying only the permission bits.
    fn chmod(&mut self, path: &str, mode: u32) -> SftpResult<()>;

    fn close(&mut self) -> SftpResult<()>;
}

/// Opens SSH sessions up to (not including) authentication.
pub trait SftpDialer {
    type Transport: SftpTransport;

    fn dial(&self, host: &str, settings: &SftpSettings) -> SftpResult<Self::Transport>;
}

// ── ssh2 adapter ─────────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy)]
pub struct Ssh2Dialer;

impl SftpDialer for Ssh2Dialer {
    type Transport = Ssh2Transport;

    fn dial(&self, host: &str, settings: &SftpSettings) -> SftpResult<Ssh2Transport> {
        let addr = (host, settings.port)
            .to_socket_addrs()
            .map_err(|e| SftpError::connection(format!("cannot resolve {}: {}", host, e)))?
            .next()
            .ok_or_else(|| SftpError::connection(format!("no address for {}", host)))?;

        debug!("Dialing SSH {} ({})", host, addr);
        let tcp = TcpStream::connect_timeout(&addr, settings.connect_timeout())
            .map_err(|e| {
                SftpError::connection(format!("TCP connection to {} failed: {}", addr, e))
            })?;

        let mut session = Session::new()?;
        session.set_tcp_stream(tcp);
        session.handshake()?;

        Ok(Ssh2Transport { session, sftp: None })
    }
}

/// An `ssh2::Session` and, once authenticated, its SFTP channel.
pub struct Ssh2Transport {
    session: Session,
    sftp: Option<Sftp>,
}

impl Ssh2Transport {
    fn channel(&self) -> SftpResult<&Sftp> {
        self.sftp
            .as_ref()
            .ok_or_else(|| SftpError::connection("SFTP subsystem not open"))
    }
}

fn attributes(stat: &FileStat) -> SftpAttributes {
    let mut attrs = SftpAttributes::from_mode(stat.perm, stat.size, stat.mtime);
    // Some servers omit the type bits; fall back to ssh2's helpers.
    if attrs.kind == EntryKind::Other {
        if stat.is_dir() {
            attrs.kind = EntryKind::Directory;
        } else if stat.is_file() {
            attrs.kind = EntryKind::File;
        }
    }
    attrs
}

impl SftpTransport for Ssh2Transport {
    fn authenticate(&mut self, username: &str, password: &str) -> SftpResult<()> {
        self.session.userauth_password(username, password)?;
        if !self.session.authenticated() {
            return Err(SftpError::auth_failed("not authenticated after password exchange"));
        }
        self.sftp = Some(self.session.sftp()?);
        Ok(())
    }

    fn home(&mut self) -> SftpResult<String> {
        let resolved = self.channel()?.realpath(Path::new("."))?;
        Ok(resolved.to_string_lossy().to_string())
    }

    fn stat(&mut self, path: &str) -> SftpResult<SftpAttributes> {
        Ok(attributes(&self.channel()?.stat(Path::new(path))?))
    }

    fn readdir(&mut self, path: &str) -> SftpResult<Vec<(String, SftpAttributes)>> {
        let raw = self.channel()?.readdir(Path::new(path))?;
        Ok(raw
            .into_iter()
            .filter_map(|(entry_path, stat)| {
                let name = entry_path.file_name()?.to_string_lossy().to_string();
                Some((name, attributes(&stat)))
            })
            .collect())
    }

    fn mkdir(&mut self, path: &str, mode: u32) -> SftpResult<()> {
        Ok(self.channel()?.mkdir(Path::new(path), mode as i32)?)
    }

    fn rmdir(&mut self, path: &str) -> SftpResult<()> {
        Ok(self.channel()?.rmdir(Path::new(path))?)
    }

    fn unlink(&mut self, path: &str) -> SftpResult<()> {
        Ok(self.channel()?.unlink(Path::new(path))?)
    }

    fn rename(&mut self, from: &str, to: &str) -> SftpResult<()> {
        Ok(self.channel()?.rename(
            Path::new(from),
            Path::new(to),
            Some(RenameFlags::ATOMIC | RenameFlags::NATIVE),
        )?)
    }

    fn read_file(&mut self, path: &str) -> SftpResult<Vec<u8>> {
        let mut file = self.channel()?.open(Path::new(path))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn write_file(&mut self, path: &str, reader: &mut dyn Read) -> SftpResult<u64> {
        let mut file = self.channel()?.create(Path::new(path))?;
        Ok(io::copy(reader, &mut file)?)
    }

    fn chmod(&mut self, path: &str, mode: u32) -> SftpResult<()> {
        let stat = FileStat {
            size: None,
            uid: None,
            gid: None,
            perm: Some(mode),
            atime: None,
            mtime: None,
        };
        Ok(self.channel()?.setstat(Path::new(path), stat)?)
    }

    fn close(&mut self) -> SftpResult<()> {
        self.sftp = None;
        Ok(self.session.disconnect(None, "ferry session closed", None)?)
    }
}
