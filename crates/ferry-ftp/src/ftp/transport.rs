//! Primitive FTP transport.
//!
//! `FtpTransport` is the minimal reply-code session the backend needs. The
//! production implementation wraps `suppaftp::FtpStream`; tests use the
//! in-memory transport from `ftp::memory`.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::types::FtpSettings;
use log::debug;
use std::io::{self, Read};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpStream, Mode};

/// A logged-in-or-not FTP control connection. Every call blocks until the
/// server answers; rejections come back as `FtpError::from_reply`.
pub trait FtpTransport {
    fn login(&mut self, username: &str, password: &str) -> FtpResult<()>;

    /// Binary TYPE plus passive or active data connections.
    fn configure(&mut self, passive: bool) -> FtpResult<()>;

    fn pwd(&mut self) -> FtpResult<String>;

    fn cwd(&mut self, path: &str) -> FtpResult<()>;

    /// Raw LIST lines for `path`, or for the working directory.
    fn list(&mut self, path: Option<&str>) -> FtpResult<Vec<String>>;

    fn mkdir(&mut self, path: &str) -> FtpResult<()>;

    fn rmdir(&mut self, path: &str) -> FtpResult<()>;

    fn delete(&mut self, path: &str) -> FtpResult<()>;

    fn rename(&mut self, from: &str, to: &str) -> FtpResult<()>;

    fn retrieve(&mut self, path: &str) -> FtpResult<Vec<u8>>;

    /// STOR `reader` to `path`, returning the number of bytes written.
    fn store(&mut self, path: &str, reader: &mut dyn Read) -> FtpResult<u64>;

    fn quit(&mut self) -> FtpResult<()>;
}

/// Opens control connections. Kept separate from the transport so a
/// backend can be built before any socket exists.
pub trait FtpDialer {
    type Transport: FtpTransport;

    fn dial(&self, host: &str, settings: &FtpSettings) -> FtpResult<Self::Transport>;
}

// ── suppaftp adapter ─────────────────────────────────────────────────────────

impl From<suppaftp::FtpError> for FtpError {
    fn from(e: suppaftp::FtpError) -> Self {
        match &e {
            suppaftp::FtpError::UnexpectedResponse(resp) => {
                FtpError::from_reply(resp.status.code(), &e.to_string())
            }
            suppaftp::FtpError::ConnectionError(io) => FtpError::connection_failed(io.to_string()),
            _ => FtpError::protocol_error(e.to_string()),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SuppaFtpDialer;

impl FtpDialer for SuppaFtpDialer {
    type Transport = SuppaFtpTransport;

    fn dial(&self, host: &str, settings: &FtpSettings) -> FtpResult<SuppaFtpTransport> {
        let addr = (host, settings.port)
            .to_socket_addrs()
            .map_err(|e| FtpError::connection_failed(format!("cannot resolve {}: {}", host, e)))?
            .next()
            .ok_or_else(|| FtpError::connection_failed(format!("no address for {}", host)))?;

        debug!("Dialing FTP {} ({})", host, addr);
        let stream = FtpStream::connect(addr)?;
        apply_timeouts(stream.get_ref(), settings.connect_timeout()).map_err(|e| {
            FtpError::connection_failed(format!("cannot set timeouts for {}: {}", host, e))
        })?;
        Ok(SuppaFtpTransport { stream })
    }
}

/// Bound every later read and write on the control socket. A zero timeout
/// leaves the socket blocking.
fn apply_timeouts(tcp: &TcpStream, timeout: Duration) -> io::Result<()> {
    let timeout = Some(timeout).filter(|t| !t.is_zero());
    tcp.set_read_timeout(timeout)?;
    tcp.set_write_timeout(timeout)
}

/// `suppaftp::FtpStream` behind the primitive transport trait.
pub struct SuppaFtpTransport {
    stream: FtpStream,
}

impl FtpTransport for SuppaFtpTransport {
    fn login(&mut self, username: &str, password: &str) -> FtpResult<()> {
        Ok(self.stream.login(username, password)?)
    }

    fn configure(&mut self, passive: bool) -> FtpResult<()> {
        self.stream.transfer_type(FileType::Binary)?;
        self.stream.set_mode(if passive { Mode::Passive } else { Mode::Active });
        Ok(())
    }

    fn pwd(&mut self) -> FtpResult<String> {
        Ok(self.stream.pwd()?)
    }

    fn cwd(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream.cwd(path)?)
    }

    fn list(&mut self, path: Option<&str>) -> FtpResult<Vec<String>> {
        Ok(self.stream.list(path)?)
    }

    fn mkdir(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream.mkdir(path)?)
    }

    fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream.rmdir(path)?)
    }

    fn delete(&mut self, path: &str) -> FtpResult<()> {
        Ok(self.stream.rm(path)?)
    }

    fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        Ok(self.stream.rename(from, to)?)
    }

    fn retrieve(&mut self, path: &str) -> FtpResult<Vec<u8>> {
        let cursor = self.stream.retr_as_buffer(path)?;
        Ok(cursor.into_inner())
    }

    fn store(&mut self, path: &str, reader: &mut dyn Read) -> FtpResult<u64> {
        let mut reader = reader;
        Ok(self.stream.put_file(path, &mut reader)?)
    }

    fn quit(&mut self) -> FtpResult<()> {
        Ok(self.stream.quit()?)
    }
}
