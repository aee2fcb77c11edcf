//! In-memory reply-code transport.
//!
//! Behaves like a small Unix FTP server over a shared `MemoryServer`:
//! server-side working directory, 530 before login, 550 for anything
//! missing, 553 for names that cannot be created, `ls -l` style LIST lines.
//! Every command is appended to a journal shared with the dialer.

use crate::ftp::error::{FtpError, FtpResult};
use crate::ftp::transport::{FtpDialer, FtpTransport};
use crate::ftp::types::FtpSettings;
use ferry_core::remote::memory::{MemoryFault, MemoryStat, MemoryTree, SharedServer};
use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;

type Journal = Rc<RefCell<Vec<String>>>;

#[derive(Clone)]
pub struct MemoryFtpDialer {
    server: SharedServer,
    journal: Journal,
}

impl MemoryFtpDialer {
    pub fn new(server: SharedServer) -> Self {
        Self {
            server,
            journal: Rc::new(RefCell::new(Vec::new())),
        }
    }

    pub fn server(&self) -> SharedServer {
        Rc::clone(&self.server)
    }

    /// Commands issued by every transport this dialer opened, in order.
    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }
}

impl FtpDialer for MemoryFtpDialer {
    type Transport = MemoryFtpTransport;

    fn dial(&self, host: &str, settings: &FtpSettings) -> FtpResult<MemoryFtpTransport> {
        if self.server.borrow().is_offline() {
            return Err(FtpError::connection_failed(format!(
                "{}:{}: connection refused",
                host, settings.port
            )));
        }
        Ok(MemoryFtpTransport {
            server: Rc::clone(&self.server),
            journal: Rc::clone(&self.journal),
            cwd: "/".to_string(),
            logged_in: false,
            closed: false,
        })
    }
}

pub struct MemoryFtpTransport {
    server: SharedServer,
    journal: Journal,
    cwd: String,
    logged_in: bool,
    closed: bool,
}

fn unavailable(path: &str, fault: MemoryFault) -> FtpError {
    FtpError::from_reply(550, &format!("{}: {}", path, fault))
}

fn reply_for(path: &str, fault: MemoryFault) -> FtpError {
    match fault {
        MemoryFault::AlreadyExists | MemoryFault::InvalidTarget => {
            FtpError::from_reply(553, &format!("{}: {}", path, fault))
        }
        _ => unavailable(path, fault),
    }
}

fn render_mode(stat: &MemoryStat) -> String {
    let mut out = String::with_capacity(10);
    out.push(match (&stat.link_target, stat.is_dir) {
        (Some(_), _) => 'l',
        (None, true) => 'd',
        (None, false) => '-',
    });
    let mode = stat.mode;
    for shift in [6u32, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        out.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        out.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        out.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    out
}

fn list_line(stat: &MemoryStat) -> String {
    let name = match &stat.link_target {
        Some(target) => format!("{} -> {}", stat.name, target),
        None => stat.name.clone(),
    };
    format!(
        "{} 1 ferry ferry {:>8} {} {}",
        render_mode(stat),
        stat.size,
        stat.modified.format("%b %e  %Y"),
        name
    )
}

impl MemoryFtpTransport {
    fn record(&self, command: String) {
        self.journal.borrow_mut().push(command);
    }

    /// Journal the command and refuse it when the session cannot take it.
    fn begin(&self, command: String) -> FtpResult<()> {
        self.record(command);
        if self.closed {
            return Err(FtpError::disconnected("control connection closed"));
        }
        if !self.logged_in {
            return Err(FtpError::from_reply(530, "Please login with USER and PASS."));
        }
        Ok(())
    }

    fn resolve(&self, path: &str) -> String {
        MemoryTree::normalize(&self.cwd, path)
    }
}

impl FtpTransport for MemoryFtpTransport {
    fn login(&mut self, username: &str, password: &str) -> FtpResult<()> {
        self.record(format!("USER {}", username));
        if self.closed {
            return Err(FtpError::disconnected("control connection closed"));
        }
        let server = self.server.borrow();
        if !server.accepts(username, password) {
            return Err(FtpError::from_reply(530, "Login incorrect."));
        }
        self.cwd = server.home();
        self.logged_in = true;
        Ok(())
    }

    fn configure(&mut self, passive: bool) -> FtpResult<()> {
        self.begin("TYPE I".to_string())?;
        self.record(if passive { "PASV" } else { "PORT" }.to_string());
        Ok(())
    }

    fn pwd(&mut self) -> FtpResult<String> {
        self.begin("PWD".to_string())?;
        Ok(self.cwd.clone())
    }

    fn cwd(&mut self, path: &str) -> FtpResult<()> {
        self.begin(format!("CWD {}", path))?;
        let target = self.resolve(path);
        if self.server.borrow().tree.is_dir(&target) {
            self.cwd = target;
            Ok(())
        } else {
            Err(unavailable(path, MemoryFault::NotFound))
        }
    }

    fn list(&mut self, path: Option<&str>) -> FtpResult<Vec<String>> {
        self.begin(format!("LIST {}", path.unwrap_or("")).trim_end().to_string())?;
        let target = path.map(|p| self.resolve(p)).unwrap_or_else(|| self.cwd.clone());
        let server = self.server.borrow();
        if server.tree.is_file(&target) {
            let stat = server.tree.stat(&target).map_err(|f| unavailable(&target, f))?;
            return Ok(vec![list_line(&stat)]);
        }
        let children = server.tree.children(&target).map_err(|f| unavailable(&target, f))?;
        Ok(children.iter().map(list_line).collect())
    }

    fn mkdir(&mut self, path: &str) -> FtpResult<()> {
        self.begin(format!("MKD {}", path))?;
        let target = self.resolve(path);
        self.server
            .borrow_mut()
            .tree
            .mkdir(&target)
            .map_err(|f| unavailable(path, f))
    }

    fn rmdir(&mut self, path: &str) -> FtpResult<()> {
        self.begin(format!("RMD {}", path))?;
        let target = self.resolve(path);
        self.server
            .borrow_mut()
            .tree
            .rmdir(&target)
            .map_err(|f| unavailable(path, f))
    }

    fn delete(&mut self, path: &str) -> FtpResult<()> {
        self.begin(format!("DELE {}", path))?;
        let target = self.resolve(path);
        self.server
            .borrow_mut()
            .tree
            .remove_file(&target)
            .map_err(|f| unavailable(path, f))
    }

    fn rename(&mut self, from: &str, to: &str) -> FtpResult<()> {
        self.begin(format!("RNFR {}", from))?;
        let source = self.resolve(from);
        if !self.server.borrow().tree.exists(&source) {
            return Err(unavailable(from, MemoryFault::NotFound));
        }
        self.begin(format!("RNTO {}", to))?;
        let target = self.resolve(to);
        self.server
            .borrow_mut()
            .tree
            .rename(&source, &target)
            .map_err(|f| reply_for(to, f))
    }

    fn retrieve(&mut self, path: &str) -> FtpResult<Vec<u8>> {
        self.begin(format!("RETR {}", path))?;
        let target = self.resolve(path);
        self.server.borrow().tree.read(&target).map_err(|f| unavailable(path, f))
    }

    fn store(&mut self, path: &str, reader: &mut dyn Read) -> FtpResult<u64> {
        self.begin(format!("STOR {}", path))?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let target = self.resolve(path);
        self.server
            .borrow_mut()
            .tree
            .write(&target, &data)
            .map_err(|f| FtpError::from_reply(553, &format!("{}: {}", path, f)))?;
        Ok(data.len() as u64)
    }

    fn quit(&mut self) -> FtpResult<()> {
        self.record("QUIT".to_string());
        self.closed = true;
        self.logged_in = false;
        Ok(())
    }
}
