//! Unified error handling for smcfan
//!
//! A single error type shared by the control engine and the daemon.
//! Variants are grouped by the layer that raises them; `is_fatal` tells the
//! daemon which ones must terminate the process.

use std::io;
use std::path::PathBuf;

/// Result type alias using SmcfanError
pub type Result<T> = std::result::Result<T, SmcfanError>;

/// Unified error type for all smcfan operations
#[derive(thiserror::Error, Debug)]
pub enum SmcfanError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Hardware Errors
    // ============================================================================
    #[error("No applesmc device found under {0}")]
    DeviceNotFound(PathBuf),

    #[error("No temperature sensors found under {0}")]
    NoSensors(PathBuf),

    #[error("No fans found under {0}")]
    NoFans(PathBuf),

    #[error("Failed to read temperature from {path}: {reason}")]
    SensorRead {
        path: PathBuf,
        reason: String,
    },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Daemon Errors
    // ============================================================================
    #[error("PID file error: {0}")]
    PidFile(String),

    #[error("Signal handling error: {0}")]
    Signal(String),
}

impl SmcfanError {
    /// Create a sensor read error
    pub fn sensor_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::SensorRead {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Errors the process must not keep running after: there is no fan to
    /// control or no sensor to control it with.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::DeviceNotFound(_) | Self::NoSensors(_) | Self::NoFans(_)
        )
    }
}
