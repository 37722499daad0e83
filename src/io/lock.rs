//! Lock file management for single-instance enforcement.
//!
//! The running board holds an exclusive lock on `prayerboard.lock` in the
//! runtime directory and writes its PID there, so one-shot commands can find
//! it and ask it to reload after changing the settings record.

use anyhow::{Context, Result};
use fs2::FileExt;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::path::PathBuf;

use crate::common::utils;

/// A held instance lock; the lock is released when this is dropped.
pub struct InstanceLock {
    file: File,
    path: PathBuf,
}

impl InstanceLock {
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    /// Unlock and remove the lock file.
    pub fn release(self) {
        let _ = FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}

pub fn lock_path() -> PathBuf {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(runtime_dir).join("prayerboard.lock")
}

/// Try to become the single running instance.
///
/// Returns `Ok(None)` with the other instance's PID logged when one is
/// already running. A lock left behind by a dead process is cleaned up.
pub fn acquire_lock() -> Result<Option<InstanceLock>> {
    acquire_lock_at(lock_path())
}

fn acquire_lock_at(path: PathBuf) -> Result<Option<InstanceLock>> {
    if let Some(lock) = try_lock(&path)? {
        return Ok(Some(lock));
    }

    match read_lock_pid(&path) {
        Some(pid) if utils::is_process_running(pid) => {
            log_pipe!();
            log_error!("prayerboard is already running (PID: {pid})");
            log_block_start!("Did you mean to:");
            log_indented!("• Apply a setup link: prayerboard setup <link>");
            log_indented!("• Show the current settings: prayerboard settings");
            Ok(None)
        }
        _ => {
            log_warning!("Removing stale lock file");
            let _ = std::fs::remove_file(&path);
            try_lock(&path)
        }
    }
}

fn try_lock(path: &PathBuf) -> Result<Option<InstanceLock>> {
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("Failed to open lock file {}", path.display()))?;

    if file.try_lock_exclusive().is_err() {
        return Ok(None);
    }

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;

    Ok(Some(InstanceLock {
        file,
        path: path.clone(),
    }))
}

fn read_lock_pid(path: &PathBuf) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().lines().next()?.parse().ok()
}

/// PID of the running board, if there is one.
pub fn running_instance_pid() -> Option<u32> {
    let pid = read_lock_pid(&lock_path())?;
    (pid != std::process::id() && utils::is_process_running(pid)).then_some(pid)
}

/// Ask the running board to re-read its settings. Returns `false` when no board is running.
pub fn signal_settings_reload() -> Result<bool> {
    let Some(pid) = running_instance_pid() else {
        return Ok(false);
    };
    kill(Pid::from_raw(pid as i32), Signal::SIGUSR2)
        .with_context(|| format!("Failed to signal prayerboard (PID: {pid})"))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_writes_pid_and_release_removes_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prayerboard.lock");

        let lock = acquire_lock_at(path.clone()).unwrap().unwrap();
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
        assert_eq!(lock.path(), &path);

        lock.release();
        assert!(!path.exists());
    }

    #[test]
    fn test_stale_lock_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prayerboard.lock");
        std::fs::write(&path, "not-a-pid\n").unwrap();

        let lock = acquire_lock_at(path.clone()).unwrap();
        assert!(lock.is_some());
        assert_eq!(read_lock_pid(&path), Some(std::process::id()));
    }
}
