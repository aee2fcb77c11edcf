// ── Multi-file transfers (best effort, one report entry per path) ───────────

use crate::remote::connection::RemoteConnection;
use crate::remote::error::RemoteResult;
use crate::remote::types::*;
use log::{error, info, warn};
use std::path::{Path, PathBuf};

fn classify(label: &str, result: RemoteResult<bool>) -> ItemOutcome {
    match result {
        Ok(true) => ItemOutcome::Transferred,
        Ok(false) => {
            warn!("Skipped '{}': rejected by validation", label);
            ItemOutcome::Rejected
        }
        Err(e) => {
            error!("Transfer of '{}' failed: {}", label, e);
            ItemOutcome::Failed(e)
        }
    }
}

/// Upload every path in order. A failing item never stops the batch.
pub fn upload_all<C>(conn: &mut C, local_paths: &[PathBuf], remote_dir: &str) -> BatchReport
where
    C: RemoteConnection + ?Sized,
{
    let mut report = BatchReport::default();

    for local in local_paths {
        let label = local.display().to_string();
        let outcome = classify(&label, conn.upload_single_file(local, remote_dir));
        report.push(label, outcome);
    }

    info!(
        "Batch upload to {}: {}/{} succeeded",
        remote_dir,
        report.succeeded(),
        report.total()
    );
    report
}

/// Download every remote path into `local_dir`. A failing item never stops the batch.
pub fn download_all<C>(conn: &mut C, remote_paths: &[String], local_dir: &Path) -> BatchReport
where
    C: RemoteConnection + ?Sized,
{
    let mut report = BatchReport::default();

    for remote in remote_paths {
        let outcome = classify(remote, conn.download_single_file(local_dir, remote));
        report.push(remote.clone(), outcome);
    }

    info!(
        "Batch download into {}: {}/{} succeeded",
        local_dir.display(),
        report.succeeded(),
        report.total()
    );
    report
}
