//! Test helpers: a fake SMC device laid out like sysfs in a temp directory

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A fake `applesmc` device under `<tmp>/class/hwmon/hwmon0/device`
pub struct MockSmcDevice {
    root: TempDir,
    device: PathBuf,
    sensors: u32,
    fans: u32,
}

impl MockSmcDevice {
    pub fn new() -> Self {
        let root = TempDir::new().unwrap();
        let device = root.path().join("class/hwmon/hwmon0/device");
        fs::create_dir_all(&device).unwrap();
        fs::write(device.join("name"), "applesmc\n").unwrap();
        Self {
            root,
            device,
            sensors: 0,
            fans: 0,
        }
    }

    /// Add the next temperature channel; an empty label writes an empty label file
    pub fn sensor(mut self, label: &str, millidegrees: i64) -> Self {
        self.sensors += 1;
        let id = self.sensors;
        let label_text = if label.is_empty() {
            String::new()
        } else {
            format!("{}\n", label)
        };
        fs::write(self.path().join(format!("temp{}_label", id)), label_text).unwrap();
        self.set_value(id, millidegrees);
        self
    }

    /// Add `count` fans with both control attributes
    pub fn fans(mut self, count: u32) -> Self {
        for _ in 0..count {
            self.fans += 1;
            let idx = self.fans;
            fs::write(self.path().join(format!("fan{}_min", idx)), "1000\n").unwrap();
            fs::write(self.path().join(format!("fan{}_manual", idx)), "1\n").unwrap();
        }
        self
    }

    pub fn set_value(&self, id: u32, millidegrees: i64) {
        fs::write(
            self.path().join(format!("temp{}_input", id)),
            format!("{}\n", millidegrees),
        )
        .unwrap();
    }

    pub fn fan_min(&self, idx: u32) -> String {
        fs::read_to_string(self.path().join(format!("fan{}_min", idx))).unwrap()
    }

    pub fn fan_manual(&self, idx: u32) -> String {
        fs::read_to_string(self.path().join(format!("fan{}_manual", idx))).unwrap()
    }

    /// The hwmon class directory to hand to the locator
    pub fn hwmon_dir(&self) -> PathBuf {
        self.root.path().join("class/hwmon")
    }

    /// The device directory holding the attributes
    pub fn path(&self) -> &Path {
        &self.device
    }
}

impl Default for MockSmcDevice {
    fn default() -> Self {
        Self::new()
    }
}

/// Asserts that two floating point numbers are approximately equal
pub fn assert_approx_eq(a: f32, b: f32, tolerance: f32) {
    assert!(
        (a - b).abs() < tolerance,
        "Values {} and {} are not approximately equal (tolerance: {})",
        a,
        b,
        tolerance
    );
}
