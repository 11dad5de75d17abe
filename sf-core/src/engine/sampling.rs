//! Sampling and aggregation
//!
//! Reads every active channel once per cycle and reduces the readings to an
//! average and a maximum.
//!
//! # Outlier rejection
//!
//! When enabled, a channel is left out of this cycle's average if it sits
//! more than [`OUTLIER_SIGMA`] standard deviations away from the mean of the
//! *other* eligible channels, with the deviation floored at
//! [`MIN_STDEV_CELSIUS`]. Channels at or below [`SANITY_THRESHOLD_CELSIUS`]
//! are treated as dead and never contribute.
//!
//! Soft exclusions are per cycle only and never touch the configured
//! exclusion set. The maximum always covers every active channel.
//!
//! [`OUTLIER_SIGMA`]: crate::constants::temperature::OUTLIER_SIGMA
//! [`MIN_STDEV_CELSIUS`]: crate::constants::temperature::MIN_STDEV_CELSIUS
//! [`SANITY_THRESHOLD_CELSIUS`]: crate::constants::temperature::SANITY_THRESHOLD_CELSIUS

use std::path::Path;
use tracing::{debug, warn};

use crate::constants::{registry as limits, temperature};
use crate::error::{Result, SmcfanError};
use crate::hw::fs::PseudoFs;
use crate::hw::registry::Channel;

/// Aggregation switches, taken from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregateOptions {
    pub outlier_rejection: bool,
    pub track_maximum: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            outlier_rejection: false,
            track_maximum: true,
        }
    }
}

/// Result of one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    /// Average over contributing channels, or the fallback when none contribute
    pub average: f32,
    /// Highest active reading; `None` when untracked or nothing is active
    pub maximum: Option<f32>,
    /// Ids left out of this cycle's average by outlier rejection
    pub soft_excluded: Vec<u32>,
}

/// Read a `tempN_input` file and convert millidegrees to degrees
pub fn read_channel_value<F: PseudoFs + ?Sized>(fs: &F, path: &Path) -> Result<f32> {
    let raw = fs
        .read_prefix(path, limits::VALUE_READ_LEN)
        .map_err(|source| SmcfanError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;

    let millidegrees: i64 = raw
        .trim()
        .parse()
        .map_err(|e| SmcfanError::sensor_read(path, format!("{:?}: {}", raw.trim(), e)))?;

    Ok(millidegrees as f32 / temperature::MILLIDEGREE_DIVISOR)
}

/// Refresh the value of every non-excluded channel in place.
///
/// A channel that cannot be read keeps its previous value. Returns the number
/// of failed reads.
pub fn sample<F: PseudoFs + ?Sized>(fs: &F, channels: &mut [Channel]) -> usize {
    let mut failures = 0;
    for channel in channels.iter_mut().filter(|c| !c.excluded) {
        match read_channel_value(fs, &channel.input_path) {
            Ok(value) => channel.value = value,
            Err(e) => {
                failures += 1;
                warn!(
                    sensor = channel.id,
                    error = %e,
                    "Sensor read failed, keeping last value {:.1}",
                    channel.value
                );
            }
        }
    }
    failures
}

/// Reduce active channel values to an average and a maximum
pub fn aggregate(channels: &[Channel], options: AggregateOptions) -> Aggregate {
    let active: Vec<&Channel> = channels.iter().filter(|c| !c.excluded).collect();

    let maximum = if options.track_maximum {
        active.iter().map(|c| c.value).reduce(f32::max)
    } else {
        None
    };

    let (contributing, soft_excluded): (Vec<f32>, Vec<u32>) = if options.outlier_rejection {
        reject_outliers(&active)
    } else {
        (active.iter().map(|c| c.value).collect(), Vec::new())
    };

    let average = if contributing.is_empty() {
        debug!(
            "No contributing sensors, using fallback average {:.1}",
            temperature::FALLBACK_AVERAGE_CELSIUS
        );
        temperature::FALLBACK_AVERAGE_CELSIUS
    } else {
        contributing.iter().sum::<f32>() / contributing.len() as f32
    };

    Aggregate {
        average,
        maximum,
        soft_excluded,
    }
}

/// Split active channels into contributing values and soft-excluded ids.
/// Dead sensors are dropped from both.
fn reject_outliers(active: &[&Channel]) -> (Vec<f32>, Vec<u32>) {
    let eligible: Vec<&Channel> = active
        .iter()
        .copied()
        .filter(|c| c.value > temperature::SANITY_THRESHOLD_CELSIUS)
        .collect();

    if eligible.len() < temperature::MIN_CHANNELS_FOR_REJECTION {
        return (eligible.iter().map(|c| c.value).collect(), Vec::new());
    }

    let mut kept = Vec::with_capacity(eligible.len());
    let mut rejected = Vec::new();

    for (i, channel) in eligible.iter().enumerate() {
        let others = eligible
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != i)
            .map(|(_, c)| c.value);

        let Some((mean, stdev)) = mean_and_stdev(others) else {
            kept.push(channel.value);
            continue;
        };

        let band = temperature::OUTLIER_SIGMA * stdev.max(temperature::MIN_STDEV_CELSIUS);
        if (channel.value - mean).abs() > band {
            debug!(
                sensor = channel.id,
                value = channel.value,
                mean,
                stdev,
                "Soft-excluding outlier from average"
            );
            rejected.push(channel.id);
        } else {
            kept.push(channel.value);
        }
    }

    (kept, rejected)
}

/// Mean and sample standard deviation; `None` for fewer than two values
fn mean_and_stdev(values: impl Iterator<Item = f32>) -> Option<(f32, f32)> {
    let values: Vec<f32> = values.collect();
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f32;
    let mean = values.iter().sum::<f32>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / (n - 1.0);
    Some((mean, variance.sqrt()))
}
