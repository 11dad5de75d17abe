//! Control engine
//!
//! [`ControlEngine`] owns everything the control loop needs: the filesystem
//! handle, the active configuration and the device registry. One call to
//! [`ControlEngine::run_cycle`] performs sample, aggregate, compute, actuate
//! and report in that order.
//!
//! Reloading builds a complete new registry before replacing the current one,
//! so a cycle always sees either the old state or the new state.

pub mod control_law;
pub mod report;
pub mod sampling;

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::FanConfig;
use crate::error::Result;
use crate::hw::fs::{PseudoFs, SysFs};
use crate::hw::registry::Registry;
use crate::hw::{actuation, locator};

pub use control_law::{
    compute_speed, ControlInputs, ControlSource, ControlWindow, ControlWindows, FanRange,
};
pub use sampling::{aggregate, sample, Aggregate, AggregateOptions};

/// Result of one control cycle
#[derive(Debug, Clone, PartialEq)]
pub struct ControlState {
    pub average: f32,
    pub maximum: Option<f32>,
    pub primary: [Option<f32>; 2],
    pub speed: i32,
    pub source: ControlSource,
    /// Ids left out of this cycle's average
    pub soft_excluded: Vec<u32>,
}

/// Sensor-to-fan control context
pub struct ControlEngine<F: PseudoFs = SysFs> {
    fs: F,
    /// hwmon class directory; `None` when the engine was bound to a fixed device
    hwmon_dir: Option<PathBuf>,
    config: FanConfig,
    windows: ControlWindows,
    registry: Registry,
    last_state: Option<ControlState>,
}

impl<F: PseudoFs> ControlEngine<F> {
    /// Locate the device under `hwmon_dir` and discover its channels
    pub fn start(fs: F, hwmon_dir: &Path, config: FanConfig) -> Result<Self> {
        let device_path = locator::locate(hwmon_dir)?;
        let mut engine = Self::with_device(fs, &device_path, config)?;
        engine.hwmon_dir = Some(hwmon_dir.to_path_buf());
        Ok(engine)
    }

    /// Bind to a known device directory, skipping the locator
    pub fn with_device(fs: F, device_path: &Path, config: FanConfig) -> Result<Self> {
        let registry = Registry::discover(&fs, device_path, &config.exclude)?;
        registry.log_manifest();
        config.log_parameters();

        Ok(Self {
            windows: config.windows(),
            fs,
            hwmon_dir: None,
            config,
            registry,
            last_state: None,
        })
    }

    /// Run one control cycle and return what was decided
    pub fn run_cycle(&mut self) -> ControlState {
        let failures = sample(&self.fs, self.registry.channels_mut());
        if failures > 0 {
            debug!("{} sensor read(s) failed this cycle", failures);
        }

        let agg = aggregate(self.registry.channels(), self.config.aggregate_options());
        let primary = [0, 1].map(|slot| self.registry.primary(slot).map(|c| c.value));

        let inputs = ControlInputs {
            average: agg.average,
            maximum: agg.maximum,
            primary,
        };
        let (speed, source) = compute_speed(&inputs, &self.windows);

        let written = actuation::apply(&self.fs, speed, self.registry.actuators());
        if !written.is_complete() {
            debug!("{} fan write(s) failed this cycle", written.failed);
        }

        let state = ControlState {
            average: agg.average,
            maximum: agg.maximum,
            primary,
            speed,
            source,
            soft_excluded: agg.soft_excluded,
        };
        report::report(&state, &self.registry, self.config.log_level);

        self.last_state = Some(state.clone());
        state
    }

    /// Apply `config` and rediscover the device.
    ///
    /// On error the engine keeps its current configuration and registry.
    pub fn reload(&mut self, config: FanConfig) -> Result<()> {
        let device_path = match &self.hwmon_dir {
            Some(dir) => locator::locate(dir)?,
            None => self.registry.device_path().to_path_buf(),
        };

        let registry = Registry::discover(&self.fs, &device_path, &config.exclude)?;
        registry.log_manifest();
        config.log_parameters();

        self.windows = config.windows();
        self.registry = registry;
        self.config = config;
        self.last_state = None;
        info!("Configuration reloaded");
        Ok(())
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn config(&self) -> &FanConfig {
        &self.config
    }

    pub fn last_state(&self) -> Option<&ControlState> {
        self.last_state.as_ref()
    }

    pub fn poll_interval(&self) -> Duration {
        self.config.poll_interval()
    }
}
