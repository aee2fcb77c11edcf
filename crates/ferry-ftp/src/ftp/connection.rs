//! `RemoteConnection` over a reply-code FTP transport.

use crate::ftp::error::{FtpErrorKind, FtpResult};
use crate::ftp::parser;
use crate::ftp::transport::{FtpDialer, FtpTransport};
use crate::ftp::types::FtpSettings;
use ferry_core::remote::path;
use ferry_core::remote::{
    ConnectOutcome, EntryKind, Protocol, RemoteConnection, RemoteEntry, RemoteError,
    RemoteResult, SessionState,
};
use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;

/// FTP backend. Owns at most one control connection, opened by `connect`
/// and dropped by `disconnect`.
pub struct FtpConnection<D: FtpDialer> {
    dialer: D,
    settings: FtpSettings,
    state: SessionState,
    transport: Option<D::Transport>,
}

impl<D: FtpDialer> FtpConnection<D> {
    pub fn new(dialer: D, settings: FtpSettings) -> Self {
        Self {
            dialer,
            settings,
            state: SessionState::Unconnected,
            transport: None,
        }
    }

    pub fn settings(&self) -> &FtpSettings {
        &self.settings
    }

    fn session(&mut self) -> RemoteResult<&mut D::Transport> {
        match self.state {
            SessionState::Connected => {
                self.transport.as_mut().ok_or_else(RemoteError::not_connected)
            }
            SessionState::Unconnected => Err(RemoteError::not_connected()),
            SessionState::Disconnected => {
                Err(RemoteError::invalid_state("session already disconnected"))
            }
        }
    }

    fn list_raw(&mut self, target: Option<&str>) -> RemoteResult<Vec<RemoteEntry>> {
        let transport = self.session()?;
        match transport.list(target) {
            Ok(lines) => Ok(parser::parse_lines(&lines)),
            Err(e) if e.is_unavailable() => {
                debug!("LIST {:?} unavailable: {}", target, e);
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }
}

// ── Directory probe ──────────────────────────────────────────────────────────

/// Change into `path`, run `body`, then change back to the directory that
/// was current before the probe. The restore runs on both the success and
/// the rejection path; `Ok(None)` means the server refused the CWD.
fn within_directory<T, R>(
    transport: &mut T,
    path: &str,
    body: impl FnOnce(&mut T) -> FtpResult<R>,
) -> FtpResult<Option<R>>
where
    T: FtpTransport + ?Sized,
{
    let origin = transport.pwd()?;

    let outcome = match transport.cwd(path) {
        Ok(()) => body(transport).map(Some),
        Err(e) if e.is_rejection() => {
            debug!("CWD {} refused: {}", path, e);
            Ok(None)
        }
        Err(e) => Err(e),
    };

    match transport.cwd(&origin) {
        Ok(()) => outcome,
        // The probe's own failure wins over the restore failure.
        Err(restore) => outcome.and(Err(restore)),
    }
}

fn probe_directory<T: FtpTransport + ?Sized>(transport: &mut T, path: &str) -> FtpResult<bool> {
    Ok(within_directory(transport, path, |_| Ok(()))?.is_some())
}

/// `Ok(false)` for a refused command, `Err` for anything that broke the session.
fn accepted(result: FtpResult<()>, action: &str, target: &str) -> RemoteResult<bool> {
    match result {
        Ok(()) => Ok(true),
        Err(e) if e.is_rejection() => {
            warn!("{} {} refused: {}", action, target, e);
            Ok(false)
        }
        Err(e) => {
            error!("{} {} failed: {}", action, target, e);
            Err(e.into())
        }
    }
}

impl<D: FtpDialer> RemoteConnection for FtpConnection<D> {
    fn protocol(&self) -> Protocol {
        Protocol::Ftp
    }

    fn state(&self) -> SessionState {
        self.state
    }

    // ── Lifecycle ────────────────────────────────────────────────────────────

    fn connect(
        &mut self,
        host: &str,
        username: &str,
        password: &str,
    ) -> RemoteResult<ConnectOutcome> {
        if self.state != SessionState::Unconnected {
            return Err(RemoteError::invalid_state(format!(
                "cannot connect from state {:?}",
                self.state
            )));
        }

        let mut transport = match self.dialer.dial(host, &self.settings) {
            Ok(t) => t,
            Err(e) => {
                error!("FTP connection to {}:{} failed: {}", host, self.settings.port, e);
                return Ok(ConnectOutcome::TransportFailure { reason: e.to_string() });
            }
        };

        if let Err(e) = transport.login(username, password) {
            let _ = transport.quit();
            return Ok(if e.kind == FtpErrorKind::AuthFailed {
                warn!("FTP login for '{}' on {} rejected", username, host);
                ConnectOutcome::RejectedCredentials
            } else {
                error!("FTP login on {} failed: {}", host, e);
                ConnectOutcome::TransportFailure { reason: e.to_string() }
            });
        }

        if let Err(e) = transport.configure(self.settings.passive) {
            error!("FTP session setup on {} failed: {}", host, e);
            let _ = transport.quit();
            return Ok(ConnectOutcome::TransportFailure { reason: e.to_string() });
        }

        self.transport = Some(transport);
        self.state = SessionState::Connected;
        info!(
            "FTP connected to {}:{} as {} ({} mode)",
            host,
            self.settings.port,
            username,
            if self.settings.passive { "passive" } else { "active" }
        );
        Ok(ConnectOutcome::Authenticated)
    }

    fn disconnect(&mut self) -> RemoteResult<()> {
        if self.state != SessionState::Connected {
            return Err(RemoteError::invalid_state(format!(
                "cannot disconnect from state {:?}",
                self.state
            )));
        }
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.quit() {
                warn!("FTP QUIT failed, dropping the connection anyway: {}", e);
            }
        }
        self.state = SessionState::Disconnected;
        info!("FTP disconnected");
        Ok(())
    }

    // ── Navigation / listing ─────────────────────────────────────────────────

    fn current_directory(&mut self) -> RemoteResult<String> {
        Ok(self.session()?.pwd()?)
    }

    fn list_current_directory(&mut self) -> RemoteResult<Vec<RemoteEntry>> {
        self.list_raw(None)
    }

    fn list_directory(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        self.list_raw(Some(path::trim_trailing(path)))
    }

    // ── Existence probes ─────────────────────────────────────────────────────

    fn directory_exists(&mut self, path: &str) -> RemoteResult<bool> {
        let target = path::trim_trailing(path);
        if target.is_empty() {
            return Ok(false);
        }
        Ok(probe_directory(self.session()?, target)?)
    }

    fn file_exists(&mut self, path: &str) -> RemoteResult<bool> {
        let target = path::trim_trailing(path);
        let name = path::basename(target);
        if name.is_empty() || name == "/" {
            return Ok(false);
        }
        let listing = match path::parent(target) {
            Some(parent) => self.list_raw(Some(parent))?,
            None => self.list_raw(None)?,
        };
        let Some(entry) = listing.into_iter().find(|e| e.name == name) else {
            return Ok(false);
        };
        match entry.kind {
            EntryKind::File => Ok(true),
            // A link names a file unless the server lets us CWD through it.
            EntryKind::Symlink => Ok(!probe_directory(self.session()?, target)?),
            EntryKind::Directory | EntryKind::Other => Ok(false),
        }
    }

    // ── Mutations ────────────────────────────────────────────────────────────

    fn create_directory(&mut self, path: &str) -> RemoteResult<bool> {
        let target = path::trim_trailing(path);
        if target.is_empty() {
            return Ok(false);
        }
        if self.directory_exists(target)? {
            debug!("Directory {} already present", target);
            return Ok(true);
        }
        let created = accepted(self.session()?.mkdir(target), "MKD", target)?;
        if created {
            info!("Created remote directory {}", target);
        }
        Ok(created)
    }

    fn delete_file(&mut self, path: &str) -> RemoteResult<bool> {
        let deleted = accepted(self.session()?.delete(path), "DELE", path)?;
        if deleted {
            info!("Deleted remote file {}", path);
        }
        Ok(deleted)
    }

    fn delete_directory(&mut self, path: &str) -> RemoteResult<bool> {
        let target = path::trim_trailing(path);
        if !self.directory_exists(target)? {
            warn!("Cannot delete {}: no such directory", target);
            return Ok(false);
        }

        let children = self.list_directory(target)?;
        for entry in children.iter().filter(|e| !e.is_dir()) {
            self.delete_file(&path::join(target, &entry.name))?;
        }
        for entry in children.iter().filter(|e| e.is_dir()) {
            self.delete_directory(&path::join(target, &entry.name))?;
        }

        let removed = accepted(self.session()?.rmdir(target), "RMD", target)?;
        if removed {
            info!("Deleted remote directory {}", target);
        }
        Ok(removed)
    }

    fn upload_single_file(&mut self, local_path: &Path, remote_dir: &str) -> RemoteResult<bool> {
        if !local_path.is_file() {
            warn!("Cannot upload {}: not a regular file", local_path.display());
            return Ok(false);
        }
        let Some(name) = local_path.file_name().map(|n| n.to_string_lossy().to_string()) else {
            return Ok(false);
        };
        let remote_dir = path::trim_trailing(remote_dir);
        if !self.directory_exists(remote_dir)? {
            warn!(
                "Cannot upload {}: remote directory {} does not exist",
                local_path.display(),
                remote_dir
            );
            return Ok(false);
        }

        let remote_path = path::join(remote_dir, &name);
        let mut file = fs::File::open(local_path)?;
        match self.session()?.store(&remote_path, &mut file) {
            Ok(bytes) => {
                info!("Uploaded {} → {} ({} bytes)", local_path.display(), remote_path, bytes);
                Ok(true)
            }
            Err(e) if e.is_rejection() => {
                warn!("STOR {} refused: {}", remote_path, e);
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn download_single_file(&mut self, local_dir: &Path, remote_path: &str) -> RemoteResult<bool> {
        if !local_dir.is_dir() {
            warn!("Cannot download into {}: not a directory", local_dir.display());
            return Ok(false);
        }
        if !self.file_exists(remote_path)? {
            warn!("Cannot download {}: no such remote file", remote_path);
            return Ok(false);
        }

        let data = match self.session()?.retrieve(remote_path) {
            Ok(data) => data,
            Err(e) if e.is_rejection() => {
                warn!("RETR {} refused: {}", remote_path, e);
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };
        let target = local_dir.join(path::basename(remote_path));
        fs::write(&target, &data)?;
        info!("Downloaded {} → {} ({} bytes)", remote_path, target.display(), data.len());
        Ok(true)
    }

    fn rename_remote_file(&mut self, old: &str, new: &str) -> RemoteResult<bool> {
        if !self.file_exists(old)? && !self.directory_exists(old)? {
            warn!("Cannot rename {}: no such file or directory", old);
            return Ok(false);
        }
        if self.file_exists(new)? || self.directory_exists(new)? {
            warn!("Cannot rename {} to {}: destination exists", old, new);
            return Ok(false);
        }
        let renamed = accepted(self.session()?.rename(old, new), "RNFR/RNTO", old)?;
        if renamed {
            info!("Renamed {} → {}", old, new);
        }
        Ok(renamed)
    }

    fn supports_permissions(&self) -> bool {
        false
    }

    fn change_permission(&mut self, mode: &str, path: &str) -> RemoteResult<bool> {
        self.session()?;
        warn!("change_permission({}, {}) unsupported over FTP", mode, path);
        Err(RemoteError::unsupported("FTP has no permission-change primitive"))
    }
}
