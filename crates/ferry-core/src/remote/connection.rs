//! The connection contract shared by every backend.
//!
//! Required methods are the per-file primitives a backend must adapt from
//! its wire model. Everything built on top of them (batch transfers, search,
//! directory download / upload / copy) is a provided method delegating to
//! the protocol-neutral engines, so the recursive algorithms exist once.
//!
//! A connection is single-owner and blocking: one operation at a time.

use crate::remote::batch;
use crate::remote::error::RemoteResult;
use crate::remote::search;
use crate::remote::sync;
use crate::remote::types::*;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
pub trait RemoteConnection {
    fn protocol(&self) -> Protocol;

    fn state(&self) -> SessionState;

    // ── Lifecycle ────────────────────────────────────────────────────────────

    /// Open the session. Authentication and transport failures are
    /// reported through the outcome; `Err` means the instance is not in
    /// the `Unconnected` state.
    fn connect(
        &mut self,
        host: &str,
        username: &str,
        password: &str,
    ) -> RemoteResult<ConnectOutcome>;

    /// Close the session. Only valid while `Connected`.
    fn disconnect(&mut self) -> RemoteResult<()>;

    // ── Navigation / listing ─────────────────────────────────────────────────

    fn current_directory(&mut self) -> RemoteResult<String>;

    fn list_current_directory(&mut self) -> RemoteResult<Vec<RemoteEntry>>;

    /// Children of `path` in server order. A missing directory lists empty;
    /// use `directory_exists` to tell the two apart.
    fn list_directory(&mut self, path: &str) -> RemoteResult<Vec<RemoteEntry>>;

    // ── Existence probes ─────────────────────────────────────────────────────

    fn directory_exists(&mut self, path: &str) -> RemoteResult<bool>;

    fn file_exists(&mut self, path: &str) -> RemoteResult<bool>;

    // ── Mutations ────────────────────────────────────────────────────────────

    /// `true` if created or already present.
    fn create_directory(&mut self, path: &str) -> RemoteResult<bool>;

    fn delete_file(&mut self, path: &str) -> RemoteResult<bool>;

    /// Remove files first, then subdirectories depth-first, then `path`.
    fn delete_directory(&mut self, path: &str) -> RemoteResult<bool>;

    /// Upload `local_path` into `remote_dir` under its own file name.
    /// `false` when `local_path` is not a regular file or `remote_dir`
    /// does not exist.
    fn upload_single_file(&mut self, local_path: &Path, remote_dir: &str) -> RemoteResult<bool>;

    /// Download `remote_path` to `local_dir/<basename>`. `false` when the
    /// remote file is not reachable.
    fn download_single_file(&mut self, local_dir: &Path, remote_path: &str) -> RemoteResult<bool>;

    /// `false` if `old` is missing or `new` already exists.
    fn rename_remote_file(&mut self, old: &str, new: &str) -> RemoteResult<bool>;

    fn supports_permissions(&self) -> bool;

    /// Apply an octal mode string such as `"644"`. Backends without the
    /// capability return an `Unsupported` error.
    fn change_permission(&mut self, mode: &str, path: &str) -> RemoteResult<bool>;

    // ── Provided: batch transfers ────────────────────────────────────────────

    fn upload_multiple_files(&mut self, local_paths: &[PathBuf], remote_dir: &str) -> BatchReport {
        batch::upload_all(self, local_paths, remote_dir)
    }

    fn download_multiple_files(
        &mut self,
        remote_paths: &[String],
        local_dir: &Path,
    ) -> BatchReport {
        batch::download_all(self, remote_paths, local_dir)
    }

    // ── Provided: search ─────────────────────────────────────────────────────

    fn search_files_with_keyword(&mut self, path: &str, keyword: &str) -> RemoteResult<usize> {
        search::count_with_keyword(self, path, keyword)
    }

    fn search_files_with_extension(&mut self, path: &str, extension: &str) -> RemoteResult<usize> {
        search::count_with_extension(self, path, extension)
    }

    // ── Provided: directory sync ─────────────────────────────────────────────

    fn download_directory(
        &mut self,
        remote_dir: &str,
        local_dir: &Path,
    ) -> RemoteResult<SyncSummary> {
        sync::download_directory(self, remote_dir, local_dir)
    }

    fn upload_directory(
        &mut self,
        local_dir: &Path,
        remote_dir: &str,
    ) -> RemoteResult<SyncSummary> {
        sync::upload_directory(self, local_dir, remote_dir)
    }

    fn copy_directory(&mut self, source: &str, dest: &str) -> RemoteResult<bool> {
        sync::copy_directory(self, source, dest)
    }
}
