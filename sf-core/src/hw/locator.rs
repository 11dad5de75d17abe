//! Locating the SMC device
//!
//! Scans the hwmon class directory for the entry whose `device/name` reads
//! `applesmc` and resolves the real device directory behind it. Sensor and
//! fan attributes live in that directory.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

use crate::constants::device;
use crate::error::{Result, SmcfanError};

/// Find the SMC device directory under `hwmon_dir`.
///
/// Entries are visited in name order so the result is stable when several
/// hwmon devices are present. The first match wins.
pub fn locate(hwmon_dir: &Path) -> Result<PathBuf> {
    debug!("Scanning {:?} for {}", hwmon_dir, device::APPLESMC_ID);

    let mut entries: Vec<PathBuf> = fs::read_dir(hwmon_dir)
        .map_err(|source| SmcfanError::FileRead {
            path: hwmon_dir.to_path_buf(),
            source,
        })?
        .flatten()
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.path())
        .collect();
    entries.sort();

    for entry in entries {
        if !is_applesmc(&entry) {
            trace!("Skipped {:?}", entry);
            continue;
        }

        let device_path = entry
            .join(device::DEVICE_DIR)
            .canonicalize()
            .map_err(|source| SmcfanError::FileRead {
                path: entry.join(device::DEVICE_DIR),
                source,
            })?;

        info!("Found {} at {}", device::APPLESMC_ID, device_path.display());
        return Ok(device_path);
    }

    Err(SmcfanError::DeviceNotFound(hwmon_dir.to_path_buf()))
}

fn is_applesmc(entry: &Path) -> bool {
    fs::read_to_string(entry.join(device::NAME_FILE))
        .map(|name| name.trim() == device::APPLESMC_ID)
        .unwrap_or(false)
}
