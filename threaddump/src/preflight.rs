//! Pre-flight checks for threaddump
//!
//! Validates the target and input files before a snapshot is requested.
//! Provides clear, actionable error messages when requirements aren't met.

#![allow(unsafe_code)] // kill(pid, 0) requires unsafe

use anyhow::{bail, Result};
use std::io;
use std::path::Path;

use crate::domain::{Pid, SnapshotError};
use crate::dump::DumpConfig;
use crate::introspection::Target;

/// Run all pre-flight checks before acquiring a snapshot
///
/// A live target is checked for existence and access before its snapshot
/// directory, so a dead or foreign process is reported as such.
///
/// # Errors
/// Returns an error describing the first check that failed
pub fn run_preflight_checks(config: &DumpConfig, snapshot_dir: &Path) -> Result<()> {
    match &config.target {
        Target::Pid(pid) => {
            probe_process(*pid)?;
            check_snapshot_dir(snapshot_dir)?;
        }
        Target::SnapshotFile(path) => check_file_exists(path, "Snapshot file")?,
    }
    if let Some(ref symbols) = config.symbol_file {
        check_file_exists(symbols, "Symbol file")?;
    }
    Ok(())
}

/// Check that a live process exists and we are allowed to signal it
///
/// Uses `kill(pid, 0)`, which performs the permission check without
/// delivering a signal.
///
/// # Errors
/// `ProcessNotFound` for missing processes, `AccessDenied` when the process
/// belongs to another user
pub fn probe_process(pid: Pid) -> Result<(), SnapshotError> {
    // 0 and negative values address process groups
    if pid.0 <= 0 {
        return Err(SnapshotError::ProcessNotFound(pid));
    }

    if unsafe { libc::kill(pid.0, 0) } == 0 {
        return Ok(());
    }

    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(libc::ESRCH) => Err(SnapshotError::ProcessNotFound(pid)),
        Some(libc::EPERM) => Err(SnapshotError::AccessDenied(pid)),
        _ => Err(SnapshotError::Io(err)),
    }
}

/// Check that the agent's snapshot directory exists
fn check_snapshot_dir(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        bail!(
            "Snapshot directory not found: {}\n\n\
             Is the capture agent enabled in the target runtime?\n\
             Point to its output with --snapshot-dir or THREADDUMP_SNAPSHOT_DIR.",
            dir.display()
        );
    }
    Ok(())
}

/// Check that an input file exists and is a regular file
fn check_file_exists(path: &Path, what: &str) -> Result<()> {
    if !path.exists() {
        bail!(
            "{what} not found: {}\n\n\
             Make sure the path is correct and the file exists.",
            path.display()
        );
    }
    if !path.is_file() {
        bail!("Not a file: {}\n\n{what} must be a regular file, not a directory.", path.display());
    }
    Ok(())
}
