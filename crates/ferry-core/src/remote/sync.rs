// ── Directory sync engine (download / upload / copy) ────────────────────────
//
// Built only from the contract's per-file primitives so both backends share
// one implementation. Entries are processed in listing order.

use crate::remote::connection::RemoteConnection;
use crate::remote::error::{RemoteError, RemoteResult};
use crate::remote::path;
use crate::remote::types::*;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Staging area ─────────────────────────────────────────────────────────────

/// Local scratch directory for a single directory copy.
///
/// Removed by `release`, or by `Drop` on any early exit.
pub struct StagingArea {
    dir: TempDir,
}

impl StagingArea {
    pub fn acquire_in(parent: &Path) -> RemoteResult<Self> {
        let dir = tempfile::Builder::new()
            .prefix("ferry-staging-")
            .tempdir_in(parent)
            .map_err(|e| {
                RemoteError::local_io(format!(
                    "cannot create staging area in {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        debug!("Staging area acquired at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn release(self) -> RemoteResult<()> {
        let location = self.dir.path().to_path_buf();
        self.dir.close().map_err(|e| {
            RemoteError::local_io(format!(
                "cannot remove staging area {}: {}",
                location.display(),
                e
            ))
        })?;
        debug!("Staging area {} released", location.display());
        Ok(())
    }
}

// ── Download ─────────────────────────────────────────────────────────────────

/// Mirror `remote_dir` into `local_dir`, recreating subdirectories.
///
/// A file is skipped when its local copy is not older than the remote one.
pub fn download_directory<C>(
    conn: &mut C,
    remote_dir: &str,
    local_dir: &Path,
) -> RemoteResult<SyncSummary>
where
    C: RemoteConnection + ?Sized,
{
    fs::create_dir_all(local_dir)?;
    let mut summary = SyncSummary::default();
    download_into(conn, path::trim_trailing(remote_dir), local_dir, &mut summary)?;
    info!(
        "Downloaded {} → {}: {} transferred, {} up to date, {} failed",
        remote_dir,
        local_dir.display(),
        summary.files_transferred,
        summary.files_skipped,
        summary.failed.len()
    );
    Ok(summary)
}

fn download_into<C>(
    conn: &mut C,
    remote_dir: &str,
    local_dir: &Path,
    summary: &mut SyncSummary,
) -> RemoteResult<()>
where
    C: RemoteConnection + ?Sized,
{
    for entry in conn.list_directory(remote_dir)? {
        if entry.is_pseudo() {
            continue;
        }
        if !is_plain_name(&entry.name) {
            warn!("Ignoring entry with unsafe name '{}' in {}", entry.name, remote_dir);
            continue;
        }

        let remote_path = path::join(remote_dir, &entry.name);
        let local_path = local_dir.join(&entry.name);

        match entry.kind {
            EntryKind::Directory => {
                if !local_path.is_dir() {
                    fs::create_dir_all(&local_path)?;
                    summary.directories_created += 1;
                    debug!("Created local directory {}", local_path.display());
                }
                download_into(conn, &remote_path, &local_path, summary)?;
            }
            // Links are fetched through the download primitive, which follows
            // them; a link to a directory fails there and lands in `failed`.
            EntryKind::File | EntryKind::Symlink => {
                if local_is_current(&local_path, &entry) {
                    debug!("{} is up to date", local_path.display());
                    summary.files_skipped += 1;
                    continue;
                }
                if conn.download_single_file(local_dir, &remote_path)? {
                    summary.files_transferred += 1;
                } else {
                    warn!("Could not download {}", remote_path);
                    summary.failed.push(local_path);
                }
            }
            EntryKind::Other => {
                debug!("Skipping {} ({:?})", remote_path, entry.kind);
            }
        }
    }
    Ok(())
}

/// Local copy exists and is at least as new as the remote entry.
fn local_is_current(local: &Path, entry: &RemoteEntry) -> bool {
    let Some(remote_modified) = entry.modified else {
        return false;
    };
    match fs::metadata(local).and_then(|m| m.modified()) {
        Ok(local_modified) => DateTime::<Utc>::from(local_modified) >= remote_modified,
        Err(_) => false,
    }
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && !name.contains('/') && !name.contains('\\')
}

// ── Upload ───────────────────────────────────────────────────────────────────

/// Mirror the children of `local_dir` into `remote_dir`. Hidden entries
/// (leading `.`) are skipped.
pub fn upload_directory<C>(
    conn: &mut C,
    local_dir: &Path,
    remote_dir: &str,
) -> RemoteResult<SyncSummary>
where
    C: RemoteConnection + ?Sized,
{
    if !local_dir.is_dir() {
        return Err(RemoteError::invalid_input(format!(
            "{} is not a local directory",
            local_dir.display()
        )));
    }
    let mut summary = SyncSummary::default();
    upload_from(conn, local_dir, path::trim_trailing(remote_dir), &mut summary)?;
    info!(
        "Uploaded {} → {}: {} transferred, {} failed",
        local_dir.display(),
        remote_dir,
        summary.files_transferred,
        summary.failed.len()
    );
    Ok(summary)
}

fn upload_from<C>(
    conn: &mut C,
    local_dir: &Path,
    remote_dir: &str,
    summary: &mut SyncSummary,
) -> RemoteResult<()>
where
    C: RemoteConnection + ?Sized,
{
    for child in fs::read_dir(local_dir)? {
        let child = child?;
        let name = child.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            debug!("Skipping hidden entry {}", child.path().display());
            continue;
        }

        let local_path: PathBuf = child.path();
        if local_path.is_dir() {
            let remote_child = path::join(remote_dir, &name);
            if !conn.directory_exists(&remote_child)? {
                if !conn.create_directory(&remote_child)? {
                    warn!("Could not create remote directory {}", remote_child);
                    summary.failed.push(local_path);
                    continue;
                }
                summary.directories_created += 1;
            }
            upload_from(conn, &local_path, &remote_child, summary)?;
        } else if local_path.is_file() {
            if conn.upload_single_file(&local_path, remote_dir)? {
                summary.files_transferred += 1;
            } else {
                warn!("Could not upload {}", local_path.display());
                summary.failed.push(local_path);
            }
        }
    }
    Ok(())
}

// ── Copy ─────────────────────────────────────────────────────────────────────

/// Copy a remote directory to a new remote location on the same connection,
/// round-tripping through a local staging area under the system temp dir.
pub fn copy_directory<C>(conn: &mut C, source: &str, dest: &str) -> RemoteResult<bool>
where
    C: RemoteConnection + ?Sized,
{
    copy_directory_via(conn, source, dest, &std::env::temp_dir())
}

/// `copy_directory` with an explicit parent for the staging area.
///
/// `Ok(true)` only when every file made it across. The staging area is
/// never created when `source` is missing and is always removed afterwards.
pub fn copy_directory_via<C>(
    conn: &mut C,
    source: &str,
    dest: &str,
    staging_parent: &Path,
) -> RemoteResult<bool>
where
    C: RemoteConnection + ?Sized,
{
    let source = path::trim_trailing(source);
    let dest = path::trim_trailing(dest);

    if !conn.directory_exists(source)? {
        warn!("Copy source {} does not exist", source);
        return Ok(false);
    }

    let staging = StagingArea::acquire_in(staging_parent)?;
    let copied = copy_through(conn, source, dest, staging.path());
    let released = staging.release();

    let copied = copied?;
    released?;
    if copied {
        info!("Copied {} → {}", source, dest);
    }
    Ok(copied)
}

fn copy_through<C>(conn: &mut C, source: &str, dest: &str, staging: &Path) -> RemoteResult<bool>
where
    C: RemoteConnection + ?Sized,
{
    let downloaded = download_directory(conn, source, staging)?;

    if !conn.directory_exists(dest)? && !conn.create_directory(dest)? {
        warn!("Could not create copy destination {}", dest);
        return Ok(false);
    }

    let uploaded = upload_directory(conn, staging, dest)?;
    Ok(downloaded.is_complete() && uploaded.is_complete())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::connection::MockRemoteConnection;
    use mockall::predicate::eq;
    use tempfile::TempDir;

    fn file_entry(name: &str, modified: Option<DateTime<Utc>>) -> RemoteEntry {
        RemoteEntry {
            name: name.to_string(),
            kind: EntryKind::File,
            size: 3,
            modified,
        }
    }

    #[test]
    fn staging_area_is_removed_on_release_and_drop() {
        let parent = TempDir::new().unwrap();

        let staging = StagingArea::acquire_in(parent.path()).unwrap();
        fs::write(staging.path().join("x"), b"x").unwrap();
        staging.release().unwrap();
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);

        {
            let staging = StagingArea::acquire_in(parent.path()).unwrap();
            fs::create_dir(staging.path().join("nested")).unwrap();
        }
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_source_copies_nothing_and_stages_nothing() {
        let parent = TempDir::new().unwrap();
        let mut conn = MockRemoteConnection::new();
        conn.expect_directory_exists()
            .with(eq("/missing"))
            .times(1)
            .returning(|_| Ok(false));

        let copied = copy_directory_via(&mut conn, "/missing/", "/dest", parent.path()).unwrap();

        assert!(!copied);
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn transport_error_mid_copy_still_releases_staging() {
        let parent = TempDir::new().unwrap();
        let mut conn = MockRemoteConnection::new();
        conn.expect_directory_exists().returning(|_| Ok(true));
        conn.expect_list_directory()
            .returning(|_| Err(RemoteError::transport("connection reset")));

        let err = copy_directory_via(&mut conn, "/src", "/dest", parent.path()).unwrap_err();

        assert_eq!(err.kind, crate::remote::error::RemoteErrorKind::Transport);
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn newer_local_copy_is_not_downloaded_again() {
        let local = TempDir::new().unwrap();
        fs::write(local.path().join("keep.txt"), b"old").unwrap();

        let long_ago = DateTime::<Utc>::from_timestamp(0, 0);
        let mut conn = MockRemoteConnection::new();
        conn.expect_list_directory()
            .with(eq("/remote"))
            .returning(move |_| Ok(vec![file_entry("keep.txt", long_ago)]));
        // No download expectation: a download attempt would panic.

        let summary = download_directory(&mut conn, "/remote/", local.path()).unwrap();
        assert_eq!(summary.files_skipped, 1);
        assert_eq!(summary.files_transferred, 0);
    }

    #[test]
    fn unknown_remote_time_forces_download() {
        let local = TempDir::new().unwrap();
        fs::write(local.path().join("data.bin"), b"old").unwrap();

        let mut conn = MockRemoteConnection::new();
        conn.expect_list_directory()
            .returning(|_| Ok(vec![file_entry("data.bin", None)]));
        conn.expect_download_single_file()
            .with(eq(local.path().to_path_buf()), eq("/remote/data.bin"))
            .times(1)
            .returning(|_, _| Ok(true));

        let summary = download_directory(&mut conn, "/remote", local.path()).unwrap();
        assert_eq!(summary.files_transferred, 1);
    }

    #[test]
    fn unsafe_names_are_ignored() {
        let local = TempDir::new().unwrap();
        let mut conn = MockRemoteConnection::new();
        conn.expect_list_directory()
            .returning(|_| Ok(vec![file_entry("../escape", None), file_entry("..", None)]));

        let summary = download_directory(&mut conn, "/remote", local.path()).unwrap();
        assert_eq!(summary, SyncSummary::default());
    }

    #[test]
    fn upload_skips_hidden_entries() {
        let local = TempDir::new().unwrap();
        fs::write(local.path().join(".secret"), b"s").unwrap();
        fs::create_dir(local.path().join(".git")).unwrap();
        fs::write(local.path().join("visible.txt"), b"v").unwrap();

        let mut conn = MockRemoteConnection::new();
        conn.expect_upload_single_file()
            .withf(|p, dir| p.ends_with("visible.txt") && dir == "/up")
            .times(1)
            .returning(|_, _| Ok(true));

        let summary = upload_directory(&mut conn, local.path(), "/up/").unwrap();
        assert_eq!(summary.files_transferred, 1);
        assert_eq!(summary.directories_created, 0);
    }

    #[test]
    fn symlinks_are_downloaded_like_files() {
        let local = TempDir::new().unwrap();
        let mut conn = MockRemoteConnection::new();
        conn.expect_list_directory().with(eq("/logs")).returning(|_| {
            Ok(vec![RemoteEntry {
                name: "current.log".to_string(),
                kind: EntryKind::Symlink,
                size: 12,
                modified: None,
            }])
        });
        conn.expect_download_single_file()
            .with(eq(local.path().to_path_buf()), eq("/logs/current.log"))
            .times(1)
            .returning(|_, _| Ok(true));

        let summary = download_directory(&mut conn, "/logs", local.path()).unwrap();
        assert_eq!(summary.files_transferred, 1);
        assert!(summary.is_complete());
    }

    #[test]
    fn unreadable_link_fails_the_copy() {
        let parent = TempDir::new().unwrap();
        let mut conn = MockRemoteConnection::new();
        conn.expect_directory_exists().returning(|_| Ok(true));
        conn.expect_list_directory().with(eq("/src")).returning(|_| {
            Ok(vec![RemoteEntry {
                name: "archive".to_string(),
                kind: EntryKind::Symlink,
                size: 7,
                modified: None,
            }])
        });
        conn.expect_download_single_file()
            .withf(|_, remote| remote == "/src/archive")
            .times(1)
            .returning(|_, _| Ok(false));

        let copied = copy_directory_via(&mut conn, "/src", "/dest", parent.path()).unwrap();

        assert!(!copied);
        assert_eq!(fs::read_dir(parent.path()).unwrap().count(), 0);
    }

    #[test]
    fn existing_remote_directories_are_not_counted_as_created() {
        let local = TempDir::new().unwrap();
        fs::create_dir(local.path().join("docs")).unwrap();
        fs::write(local.path().join("docs").join("a.txt"), b"a").unwrap();

        let mut conn = MockRemoteConnection::new();
        conn.expect_directory_exists()
            .with(eq("/up/docs"))
            .times(1)
            .returning(|_| Ok(true));
        conn.expect_create_directory().never();
        conn.expect_upload_single_file()
            .withf(|p, dir| p.ends_with("a.txt") && dir == "/up/docs")
            .times(1)
            .returning(|_, _| Ok(true));

        let summary = upload_directory(&mut conn, local.path(), "/up").unwrap();
        assert_eq!(summary.files_transferred, 1);
        assert_eq!(summary.directories_created, 0);
    }

    #[test]
    fn missing_remote_directories_are_created_once() {
        let local = TempDir::new().unwrap();
        fs::create_dir(local.path().join("docs")).unwrap();

        let mut conn = MockRemoteConnection::new();
        conn.expect_directory_exists().returning(|_| Ok(false));
        conn.expect_create_directory()
            .with(eq("/up/docs"))
            .times(1)
            .returning(|_| Ok(true));

        let summary = upload_directory(&mut conn, local.path(), "/up").unwrap();
        assert_eq!(summary.directories_created, 1);
    }
}
