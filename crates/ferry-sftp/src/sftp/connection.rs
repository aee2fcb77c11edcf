// ── SFTP backend: RemoteConnection over a stat/exception transport ──────────

use crate::sftp::error::{SftpErrorKind, SftpResult};
use crate::sftp::transport::{SftpDialer, SftpTransport};
use crate::sftp::types::{SftpAttributes, SftpSettings};
use ferry_core::remote::path;
use ferry_core::remote::{
    ConnectOutcome, EntryKind, Protocol, RemoteConnection, RemoteEntry, RemoteError, RemoteResult,
    SessionState,
};
use log::{debug, error, info, warn};
use std::fs;
use std::path::Path;

const NEW_DIRECTORY_MODE: u32 = 0o755;
const MAX_MODE: u32 = 0o7777;

/// SFTP backend. The SSH session and its SFTP channel live in `transport`
/// for exactly the span between `connect` and `disconnect`.
pub struct SftpConnection<D: SftpDialer> {
    dialer: D,
    settings: SftpSettings,
    state: SessionState,
    transport: Option<D::Transport>,
    home: String,
}

impl<D: SftpDialer> SftpConnection<D> {
    pub fn new(dialer: D, settings: SftpSettings) -> Self {
        Self {
            dialer,
            settings,
            state: SessionState::Unconnected,
            transport: None,
            home: "/".to_string(),
        }
    }

    pub fn settings(&self) -> &SftpSettings {
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

    /// `stat` with every status answer folded into `None`.
    fn probe(&mut self, path: &str) -> RemoteResult<Option<SftpAttributes>> {
        match self.session()?.stat(path) {
            Ok(attrs) => Ok(Some(attrs)),
            Err(e) if e.is_rejection() => {
                debug!("stat {}: {}", path, e);
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// `Ok(false)` for a status answer, `Err` when the channel itself failed.
fn accepted(result: SftpResult<()>, action: &str, target: &str) -> RemoteResult<bool> {
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

/// Parse an octal mode string such as `"644"` or `"0755"`.
pub fn parse_mode(mode: &str) -> Option<u32> {
    let digits = mode.trim();
    if digits.is_empty() {
        return None;
    }
    u32::from_str_radix(digits, 8).ok().filter(|m| *m <= MAX_MODE)
}

impl<D: SftpDialer> RemoteConnection for SftpConnection<D> {
    fn protocol(&self) -> Protocol {
        Protocol::Sftp
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
                error!("SFTP connection to {}:{} failed: {}", host, self.settings.port, e);
                return Ok(ConnectOutcome::TransportFailure { reason: e.to_string() });
            }
        };

        if let Err(e) = transport.authenticate(username, password) {
            let _ = transport.close();
            return Ok(if e.kind == SftpErrorKind::AuthFailed {
                warn!("SFTP login for '{}' on {} rejected", username, host);
                ConnectOutcome::RejectedCredentials
            } else {
                error!("SFTP authentication on {} failed: {}", host, e);
                ConnectOutcome::TransportFailure { reason: e.to_string() }
            });
        }

        self.home = match transport.home() {
            Ok(home) => home,
            Err(e) => {
                warn!("Could not resolve SFTP login directory, using '/': {}", e);
                "/".to_string()
            }
        };
        self.transport = Some(transport);
        self.state = SessionState::Connected;
        info!(
            "SFTP connected to {}:{} as {} (home {})",
            host, self.settings.port, username, self.home
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
            if let Err(e) = transport.close() {
                warn!("SFTP session close failed, dropping it anyway: {}", e);
            }
        }
        self.state = SessionState::Disconnected;
        info!("SFTP disconnected");
        Ok(())
    }

    // ── Navigation / listing ─────────────────────────────────────────────────

    fn current_directory(&mut self) -> RemoteResult<String> {
        self.session()?;
        Ok(self.home.clone())
    }

    fn list_current_directory(&mut self) -> RemoteResult<Vec<RemoteEntry>> {
        let home = self.home.clone();
        self.list_directory(&home)
    }

    fn list_directory(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>> {
        let target = path::trim_trailing(path);
        let raw = match self.session()?.readdir(target) {
            Ok(raw) => raw,
            Err(e) if e.is_rejection() => {
                debug!("readdir {}: {}", target, e);
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };
        Ok(raw
            .into_iter()
            .map(|(name, attrs)| RemoteEntry {
                name,
                kind: attrs.kind,
                size: attrs.size,
                modified: attrs.modified,
            })
            .filter(|e| !e.is_pseudo())
            .collect())
    }

    // ── Existence probes ─────────────────────────────────────────────────────

    fn directory_exists(&mut self, path: &str) -> RemoteResult<bool> {
        let target = path::trim_trailing(path);
        if target.is_empty() {
            return Ok(false);
        }
        Ok(self.probe(target)?.map(|a| a.is_dir()).unwrap_or(false))
    }

    fn file_exists(&mut self, path: &str) -> RemoteResult<bool> {
        if path.is_empty() {
            return Ok(false);
        }
        Ok(self.probe(path)?.map(|a| a.is_file()).unwrap_or(false))
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
        let created = accepted(self.session()?.mkdir(target, NEW_DIRECTORY_MODE), "mkdir", target)?;
        if created {
            info!("Created remote directory {}", target);
        }
        Ok(created)
    }

    fn delete_file(&mut self, path: &str) -> RemoteResult<bool> {
        let deleted = accepted(self.session()?.unlink(path), "unlink", path)?;
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
        for entry in children.iter().filter(|e| e.kind != EntryKind::Directory) {
            self.delete_file(&path::join(target, &entry.name))?;
        }
        for entry in children.iter().filter(|e| e.kind == EntryKind::Directory) {
            self.delete_directory(&path::join(target, &entry.name))?;
        }

        let removed = accepted(self.session()?.rmdir(target), "rmdir", target)?;
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
        match self.session()?.write_file(&remote_path, &mut file) {
            Ok(bytes) => {
                info!("Uploaded {} → {} ({} bytes)", local_path.display(), remote_path, bytes);
                Ok(true)
            }
            Err(e) if e.is_rejection() => {
                warn!("Upload to {} refused: {}", remote_path, e);
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

        let data = match self.session()?.read_file(remote_path) {
            Ok(data) => data,
            Err(e) if e.is_rejection() => {
                warn!("Read of {} refused: {}", remote_path, e);
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
        if self.probe(old)?.is_none() {
            warn!("Cannot rename {}: no such file or directory", old);
            return Ok(false);
        }
        if self.probe(new)?.is_some() {
            warn!("Cannot rename {} to {}: destination exists", old, new);
            return Ok(false);
        }
        let renamed = accepted(self.session()?.rename(old, new), "rename", old)?;
        if renamed {
            info!("Renamed {} → {}", old, new);
        }
        Ok(renamed)
    }

    fn supports_permissions(&self) -> bool {
        true
    }

    fn change_permission(&mut self, mode: &str, path: &str) -> RemoteResult<bool> {
        self.session()?;
        let Some(bits) = parse_mode(mode) else {
            warn!("Rejected permission string '{}' for {}", mode, path);
            return Err(RemoteError::invalid_input(format!(
                "'{}' is not an octal mode between 0 and 7777",
                mode
            )));
        };
        if self.probe(path)?.is_none() {
            warn!("Cannot chmod {}: no such file or directory", path);
            return Ok(false);
        }
        let changed = accepted(self.session()?.chmod(path, bits), "chmod", path)?;
        if changed {
            info!("SFTP chmod {} → {:o}", path, bits);
        }
        Ok(changed)
    }
}
