/*
 * Shared fixtures for the integration tests
 *
 * Builds a sysfs-like tree in a temp directory:
 *   <tmp>/class/hwmon/hwmon0 -> coretemp (decoy)
 *   <tmp>/class/hwmon/hwmon1/device -> <tmp>/devices/platform/applesmc.768
 */

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct FakeSysfs {
    root: TempDir,
    device: PathBuf,
}

impl FakeSysfs {
    /// An applesmc device with the given (label, millidegrees) sensors and `fans` fans
    pub fn new(sensors: &[(&str, i64)], fans: u32) -> Self {
        let root = TempDir::new().unwrap();

        let decoy = root.path().join("class/hwmon/hwmon0/device");
        fs::create_dir_all(&decoy).unwrap();
        fs::write(decoy.join("name"), "coretemp\n").unwrap();
        fs::write(decoy.join("temp1_input"), "99000\n").unwrap();

        let device = root.path().join("devices/platform/applesmc.768");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("name"), "applesmc\n").unwrap();

        let entry = root.path().join("class/hwmon/hwmon1");
        fs::create_dir_all(&entry).unwrap();
        std::os::unix::fs::symlink(&device, entry.join("device")).unwrap();

        let fake = Self { root, device };
        for (i, (label, value)) in sensors.iter().enumerate() {
            let id = i + 1;
            fs::write(fake.device.join(format!("temp{}_label", id)), format!("{}\n", label))
                .unwrap();
            fake.set_temp(id as u32, *value);
        }
        for idx in 1..=fans {
            fs::write(fake.device.join(format!("fan{}_min", idx)), "2000\n").unwrap();
            fs::write(fake.device.join(format!("fan{}_manual", idx)), "1\n").unwrap();
        }
        fake
    }

    pub fn hwmon_dir(&self) -> PathBuf {
        self.root.path().join("class/hwmon")
    }

    pub fn device(&self) -> &Path {
        &self.device
    }

    pub fn set_temp(&self, id: u32, millidegrees: i64) {
        fs::write(
            self.device.join(format!("temp{}_input", id)),
            format!("{}\n", millidegrees),
        )
        .unwrap();
    }

    pub fn read(&self, attribute: &str) -> String {
        fs::read_to_string(self.device.join(attribute)).unwrap()
    }

    pub fn write_config(&self, name: &str, content: &str) -> PathBuf {
        let path = self.root.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }
}
