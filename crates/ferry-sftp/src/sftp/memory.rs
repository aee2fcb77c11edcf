//! In-memory stat/exception transport over a shared `MemoryServer`.
//!
//! Missing paths answer `SSH_FX_NO_SUCH_FILE`, every other refusal
//! `SSH_FX_FAILURE`. Relative paths resolve against the login directory,
//! as they do on an OpenSSH server.

use crate::sftp::error::{SftpError, SftpResult};
use crate::sftp::transport::{SftpDialer, SftpTransport};
use crate::sftp::types::{SftpAttributes, SftpSettings};
use ferry_core::remote::memory::{MemoryFault, MemoryStat, MemoryTree, SharedServer};
use std::io::Read;
use std::rc::Rc;

#[derive(Clone)]
pub struct MemorySftpDialer {
    server: SharedServer,
}

impl MemorySftpDialer {
    pub fn new(server: SharedServer) -> Self {
        Self { server }
    }

    pub fn server(&self) -> SharedServer {
        Rc::clone(&self.server)
    }
}

impl SftpDialer for MemorySftpDialer {
    type Transport = MemorySftpTransport;

    fn dial(&self, host: &str, settings: &SftpSettings) -> SftpResult<MemorySftpTransport> {
        if self.server.borrow().is_offline() {
            return Err(SftpError::connection(format!(
                "TCP connection to {}:{} failed: connection refused",
                host, settings.port
            )));
        }
        Ok(MemorySftpTransport {
            server: Rc::clone(&self.server),
            home: None,
        })
    }
}

pub struct MemorySftpTransport {
    server: SharedServer,
    /// Set once authenticated.
    home: Option<String>,
}

fn status(path: &str, fault: MemoryFault) -> SftpError {
    match fault {
        MemoryFault::NotFound => SftpError::no_such_file(path),
        other => SftpError::failure(format!("{}: {}", path, other)),
    }
}

fn attributes(stat: &MemoryStat) -> SftpAttributes {
    let type_bits = match (&stat.link_target, stat.is_dir) {
        (Some(_), _) => 0o120000,
        (None, true) => 0o040000,
        (None, false) => 0o100000,
    };
    let mtime = u64::try_from(stat.modified.timestamp()).ok();
    SftpAttributes::from_mode(Some(type_bits | stat.mode), Some(stat.size), mtime)
}

impl MemorySftpTransport {
    fn resolve(&self, path: &str) -> SftpResult<String> {
        let home = self
            .home
            .as_deref()
            .ok_or_else(|| SftpError::connection("SFTP subsystem not open"))?;
        Ok(MemoryTree::normalize(home, path))
    }
}

impl SftpTransport for MemorySftpTransport {
    fn authenticate(&mut self, username: &str, password: &str) -> SftpResult<()> {
        let server = self.server.borrow();
        if !server.accepts(username, password) {
            return Err(SftpError::auth_failed("Authentication failed (username/password)"));
        }
        self.home = Some(server.home());
        Ok(())
    }

    fn home(&mut self) -> SftpResult<String> {
        self.resolve(".")
    }

    fn stat(&mut self, path: &str) -> SftpResult<SftpAttributes> {
        let target = self.resolve(path)?;
        let stat = self.server.borrow().tree.stat(&target).map_err(|f| status(path, f))?;
        Ok(attributes(&stat))
    }

    fn readdir(&mut self, path: &str) -> SftpResult<Vec<(String, SftpAttributes)>> {
        let target = self.resolve(path)?;
        let children = self
            .server
            .borrow()
            .tree
            .children(&target)
            .map_err(|f| status(path, f))?;
        Ok(children.iter().map(|s| (s.name.clone(), attributes(s))).collect())
    }

    fn mkdir(&mut self, path: &str, mode: u32) -> SftpResult<()> {
        let target = self.resolve(path)?;
        let mut server = self.server.borrow_mut();
        server.tree.mkdir(&target).map_err(|f| status(path, f))?;
        server.tree.set_mode(&target, mode).map_err(|f| status(path, f))
    }

    fn rmdir(&mut self, path: &str) -> SftpResult<()> {
        let target = self.resolve(path)?;
        self.server.borrow_mut().tree.rmdir(&target).map_err(|f| status(path, f))
    }

    fn unlink(&mut self, path: &str) -> SftpResult<()> {
        let target = self.resolve(path)?;
        self.server
            .borrow_mut()
            .tree
            .remove_file(&target)
            .map_err(|f| status(path, f))
    }

    fn rename(&mut self, from: &str, to: &str) -> SftpResult<()> {
        let source = self.resolve(from)?;
        let target = self.resolve(to)?;
        self.server
            .borrow_mut()
            .tree
            .rename(&source, &target)
            .map_err(|f| status(from, f))
    }

    fn read_file(&mut self, path: &str) -> SftpResult<Vec<u8>> {
        let target = self.resolve(path)?;
        self.server.borrow().tree.read(&target).map_err(|f| status(path, f))
    }

    fn write_file(&mut self, path: &str, reader: &mut dyn Read) -> SftpResult<u64> {
        let target = self.resolve(path)?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        self.server
            .borrow_mut()
            .tree
            .write(&target, &data)
            .map_err(|f| status(path, f))?;
        Ok(data.len() as u64)
    }

    fn chmod(&mut self, path: &str, mode: u32) -> SftpResult<()> {
        let target = self.resolve(path)?;
        self.server
            .borrow_mut()
            .tree
            .set_mode(&target, mode)
            .map_err(|f| status(path, f))
    }

    fn close(&mut self) -> SftpResult<()> {
        self.home = None;
        Ok(())
    }
}
