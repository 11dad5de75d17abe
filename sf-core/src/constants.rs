//! Constants and configuration values for smcfan
//!
//! Centralizes paths, probe limits, control-law tuning and config bounds.
//! Add new magic numbers here rather than inline.

/// System paths
pub mod paths {
    /// Base path for hwmon devices
    pub const HWMON_BASE: &str = "/sys/class/hwmon";

    /// Default configuration file
    pub const CONFIG_FILE: &str = "/etc/smcfan.conf";

    /// Default PID file
    pub const PID_FILE: &str = "/run/smcfand.pid";

    /// Journald socket, used to pick the log sink
    pub const JOURNALD_SOCKET: &str = "/run/systemd/journal/socket";
}

/// Identification of the SMC device among hwmon entries
pub mod device {
    /// Driver name reported by the SMC hwmon device
    pub const APPLESMC_ID: &str = "applesmc";

    /// Identity file relative to an hwmon entry
    pub const NAME_FILE: &str = "device/name";

    /// Device directory relative to an hwmon entry
    pub const DEVICE_DIR: &str = "device";
}

/// Sensor and actuator discovery limits
pub mod registry {
    /// More than this many sensors means something is wrong with the device
    pub const MAX_SENSORS: u32 = 100;

    /// Upper bound on fan probing
    pub const MAX_FANS: u32 = 10;

    /// SMC keys are four characters; labels are read into a small buffer
    pub const LABEL_MAX_LEN: usize = 15;

    /// Bytes read from a `tempN_input` file
    pub const VALUE_READ_LEN: usize = 16;

    /// Labels of the primary channels, in slot order
    pub const PRIMARY_LABELS: [&str; 2] = ["TC0P", "TG0P"];

    /// Rendered in place of an empty or unreadable label
    pub const UNKNOWN_LABEL: &str = "unknown";

    /// Rendered when a label has no known description
    pub const UNKNOWN_DESCRIPTION: &str = "?";
}

/// Temperature handling
pub mod temperature {
    /// hwmon reports millidegrees Celsius
    pub const MILLIDEGREE_DIVISOR: f32 = 1000.0;

    /// Readings at or below this are treated as dead sensors by outlier rejection
    pub const SANITY_THRESHOLD_CELSIUS: f32 = 5.0;

    /// Rejection band width in standard deviations
    pub const OUTLIER_SIGMA: f32 = 2.0;

    /// Floor for the standard deviation so tightly clustered readings are not rejected
    pub const MIN_STDEV_CELSIUS: f32 = 1.0;

    /// Minimum eligible channels before outlier rejection is attempted
    pub const MIN_CHANNELS_FOR_REJECTION: usize = 3;

    /// Average used when no channel contributes. Equal to the highest
    /// configurable ceiling, so every window maps it to full speed.
    pub const FALLBACK_AVERAGE_CELSIUS: f32 = 90.0;
}

/// Fan actuation
pub mod fan {
    /// Highest speed the SMC accepts on these machines (RPM)
    pub const SPEED_LIMIT: u32 = 6200;

    /// Written to `fanN_manual` to leave the SMC in automatic mode above our floor
    pub const MANUAL_RELEASE: &str = "0";
}

/// Configuration defaults and bounds
pub mod config {
    use super::fan;

    pub const DEFAULT_AVG_FLOOR: u32 = 40;
    pub const DEFAULT_AVG_CEILING: u32 = 50;

    pub const DEFAULT_TC0P_FLOOR: u32 = 50;
    pub const DEFAULT_TC0P_CEILING: u32 = 65;

    pub const DEFAULT_TG0P_FLOOR: u32 = 65;
    pub const DEFAULT_TG0P_CEILING: u32 = 80;

    pub const DEFAULT_MAX_FLOOR: u32 = 65;
    pub const DEFAULT_MAX_CEILING: u32 = 80;
    pub const DEFAULT_MAX_FAN_MIN: u32 = 4000;

    pub const DEFAULT_FAN_MIN: u32 = 0;
    pub const DEFAULT_FAN_MAX: u32 = fan::SPEED_LIMIT;

    pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

    /// Ceilings are clamped to [MIN_CEILING, MAX_CEILING]
    pub const MIN_CEILING: u32 = 1;
    pub const MAX_CEILING: u32 = 90;

    pub const MAX_LOG_LEVEL: u8 = 2;

    pub const MIN_POLL_INTERVAL_SECS: u64 = 1;
    pub const MAX_POLL_INTERVAL_SECS: u64 = 60;

    /// Maximum number of ids in the exclude list
    pub const MAX_EXCLUDE: usize = 20;
}
