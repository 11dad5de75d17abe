//! PID file management
//!
//! The file is created exclusively and removed again when the guard drops.
//! A leftover file whose process no longer exists is treated as stale.

use std::fs;
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use sf_error::{Result, SmcfanError};

/// Holds the PID file for the lifetime of the daemon
#[derive(Debug)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    /// Write the current PID to `path`, refusing if another instance is alive
    pub fn create(path: &Path) -> Result<Self> {
        if path.exists() {
            if let Some(old_pid) = read_pid(path) {
                if process_alive(old_pid) {
                    return Err(SmcfanError::PidFile(format!(
                        "Another instance is running (PID {})",
                        old_pid
                    )));
                }
            }
            debug!("Removing stale PID file {}", path.display());
            let _ = fs::remove_file(path);
        }

        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .mode(0o644)
            .open(path)
            .map_err(|source| SmcfanError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;

        writeln!(file, "{}", std::process::id())
            .and_then(|_| file.sync_all())
            .map_err(|source| SmcfanError::FileWrite {
                path: path.to_path_buf(),
                source,
            })?;

        debug!("PID file written: {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for PidFile {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            warn!("Failed to remove PID file {}: {}", self.path.display(), e);
        }
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn process_alive(pid: i32) -> bool {
    if pid <= 0 {
        return false;
    }
    // SAFETY: signal 0 only checks that the process exists; nothing is delivered.
    unsafe { libc::kill(pid, 0) == 0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn test_create_writes_pid_and_removes_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("smcfand.pid");

        let pid_file = PidFile::create(&path).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content, format!("{}\n", std::process::id()));
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o022, 0);
        assert_eq!(pid_file.path(), path);

        drop(pid_file);
        assert!(!path.exists());
    }

    #[test]
    fn test_refuses_running_instance() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("smcfand.pid");
        let _first = PidFile::create(&path).unwrap();

        let err = PidFile::create(&path).unwrap_err();
        assert!(matches!(err, SmcfanError::PidFile(_)));
        assert!(path.exists());
    }

    #[test]
    fn test_replaces_stale_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("smcfand.pid");

        // above any pid_max, so no such process
        fs::write(&path, "999999999\n").unwrap();
        let _pid_file = PidFile::create(&path).unwrap();
        assert_eq!(read_pid(&path), Some(std::process::id() as i32));

        drop(_pid_file);
        fs::write(&path, "garbage").unwrap();
        assert!(PidFile::create(&path).is_ok());
    }

    #[test]
    fn test_process_alive() {
        assert!(process_alive(std::process::id() as i32));
        assert!(!process_alive(0));
        assert!(!process_alive(-1));
    }
}
