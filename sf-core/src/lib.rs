//! smcfan Core Library
//!
//! Fan control for Apple laptops running Linux, driven by the temperature
//! sensors the `applesmc` driver exposes under `/sys/class/hwmon`.
//!
//! # Module Structure
//!
//! - `hw/` - Device location, sensor/fan discovery and fan writes
//! - `engine/` - Sampling, control law, reporting and the control engine
//! - `config` - Configuration file loading and clamping
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use sf_core::{load_config, ControlEngine, SysFs};
//!
//! let config = load_config(Path::new("/etc/smcfan.conf")).unwrap();
//! let mut engine = ControlEngine::start(SysFs, Path::new("/sys/class/hwmon"), config).unwrap();
//! let state = engine.run_cycle();
//! println!("fans at {} rpm", state.speed);
//! ```

// Grouped modules
pub mod engine;
pub mod hw;

// Standalone modules
pub mod config;
pub mod constants;
pub mod error;

#[cfg(test)]
pub mod test_utils;

// Re-export error types
pub use error::{Result, SmcfanError};

// Re-export configuration
pub use config::{load_config, parse_config_json, parse_config_text, FanConfig};

// Re-export engine types
pub use engine::{
    compute_speed, ControlEngine, ControlInputs, ControlSource, ControlState, ControlWindow,
    ControlWindows, FanRange,
};

// Re-export hardware types
pub use hw::{locate, Actuator, Channel, PseudoFs, Registry, SysFs};
