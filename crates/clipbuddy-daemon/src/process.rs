//! Single-instance lock backed by a PID file.

use clipbuddy_core::{BuddyError, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

/// Verify if a process with the given PID is running
#[cfg(unix)]
pub fn verify_process_running(pid: u32) -> bool {
    use std::process::Command;

    // On Unix, we can use kill -0 to check if process exists
    let output = Command::new("kill").args(["-0", &pid.to_string()]).output();

    if let Ok(output) = output {
        output.status.success()
    } else {
        false
    }
}

#[cfg(windows)]
pub fn verify_process_running(pid: u32) -> bool {
    use std::process::Command;

    // On Windows, we can use tasklist to check if process exists
    let output = Command::new("tasklist")
        .args(["/FI", &format!("PID eq {}", pid), "/NH"])
        .output();

    if let Ok(output) = output {
        let output_str = String::from_utf8_lossy(&output.stdout);
        output_str.contains(&pid.to_string())
    } else {
        false
    }
}

/// PID recorded in `path`, if the file exists and holds a number.
pub fn read_pid(path: &Path) -> Option<u32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// PID of a live instance recorded in `path`.
pub fn running_instance(path: &Path) -> Option<u32> {
    read_pid(path).filter(|pid| *pid != process::id() && verify_process_running(*pid))
}

/// Held while the interactive application runs; removes the PID file on drop.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
}

impl InstanceLock {
    /// Claim `path` for this process.
    ///
    /// Fails with `AlreadyRunning` when another live process holds it. A
    /// stale or unreadable file is replaced.
    pub fn acquire(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(pid) = running_instance(&path) {
            return Err(BuddyError::AlreadyRunning(pid));
        }
        if path.exists() {
            tracing::info!("removing stale PID file {}", path.display());
            fs::remove_file(&path)?;
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&path)?;
        write!(file, "{}", process::id())?;
        tracing::debug!("wrote PID {} to {}", process::id(), path.display());
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        // Only remove the file if it is still ours
        if read_pid(&self.path) == Some(process::id()) {
            let _ = fs::remove_file(&self.path);
        }
    }
}
