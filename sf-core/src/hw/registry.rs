//! Sensor and fan registry
//!
//! Discovers the temperature channels and fan actuators exposed by the SMC
//! device. Discovery probes sequential attribute names (`temp1_input`,
//! `temp2_input`, ... and `fan1_min`/`fan1_manual`, ...) rather than listing
//! the directory, so ids and ordering never depend on readdir order.
//!
//! A registry is immutable apart from channel values. Reconfiguration builds a
//! fresh one and replaces the old one wholesale.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::constants::registry as limits;
use crate::error::{Result, SmcfanError};
use crate::hw::descriptions;
use crate::hw::fs::PseudoFs;

/// One temperature sensor
#[derive(Debug, Clone, PartialEq)]
pub struct Channel {
    /// 1-based id, equal to N in `tempN_input`
    pub id: u32,
    /// SMC key such as `TC0P`; empty when unreadable
    pub label: String,
    /// Excluded by configuration; never sampled
    pub excluded: bool,
    /// Last successfully read value in °C
    pub value: f32,
    pub input_path: PathBuf,
}

impl Channel {
    /// Label for display, `unknown` when empty
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            limits::UNKNOWN_LABEL
        } else {
            &self.label
        }
    }

    /// Static description for the label, if known
    pub fn description(&self) -> Option<&'static str> {
        descriptions::describe(&self.label)
    }
}

/// One fan control point
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actuator {
    /// 1-based index, equal to N in `fanN_min`
    pub index: u32,
    pub min_path: PathBuf,
    pub manual_path: PathBuf,
}

/// Channels and actuators of one device, as discovered at one point in time
#[derive(Debug, Clone)]
pub struct Registry {
    device_path: PathBuf,
    channels: Vec<Channel>,
    actuators: Vec<Actuator>,
    /// Index into `channels` for each entry of `PRIMARY_LABELS`
    primaries: [Option<usize>; 2],
}

impl Registry {
    /// Enumerate channels and actuators under `device_path`.
    ///
    /// Fails when the device exposes no temperature channel or no complete
    /// fan attribute pair. Unreadable labels are tolerated.
    pub fn discover<F: PseudoFs + ?Sized>(
        fs: &F,
        device_path: &Path,
        exclusions: &[u32],
    ) -> Result<Self> {
        let actuators = probe_actuators(fs, device_path);
        if actuators.is_empty() {
            return Err(SmcfanError::NoFans(device_path.to_path_buf()));
        }
        info!("Found {} fan(s)", actuators.len());

        let count = probe_channel_count(fs, device_path);
        if count == 0 {
            return Err(SmcfanError::NoSensors(device_path.to_path_buf()));
        }

        let channels: Vec<Channel> = (1..=count)
            .map(|id| Channel {
                id,
                label: read_label(fs, &device_path.join(format!("temp{}_label", id))),
                excluded: exclusions.contains(&id),
                value: 0.0,
                input_path: device_path.join(format!("temp{}_input", id)),
            })
            .collect();

        let mut primaries = [None; 2];
        for (slot, wanted) in limits::PRIMARY_LABELS.iter().enumerate() {
            // first non-excluded match wins; excluded channels are never sampled
            primaries[slot] = channels
                .iter()
                .position(|c| !c.excluded && c.label == *wanted);
            if primaries[slot].is_none() {
                info!("Primary sensor {} not present, its control window is inactive", wanted);
            }
        }

        Ok(Self {
            device_path: device_path.to_path_buf(),
            channels,
            actuators,
            primaries,
        })
    }

    pub fn device_path(&self) -> &Path {
        &self.device_path
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut [Channel] {
        &mut self.channels
    }

    pub fn actuators(&self) -> &[Actuator] {
        &self.actuators
    }

    /// Channels that are sampled and aggregated
    pub fn active_channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter().filter(|c| !c.excluded)
    }

    /// Primary channel for `slot` (0 = `TC0P`, 1 = `TG0P`)
    pub fn primary(&self, slot: usize) -> Option<&Channel> {
        self.primaries
            .get(slot)
            .copied()
            .flatten()
            .map(|idx| &self.channels[idx])
    }

    /// One line per channel: id, label, description, exclusion marker
    pub fn manifest(&self) -> Vec<String> {
        self.channels
            .iter()
            .map(|c| {
                format!(
                    "{:>2}: {} - {}{}",
                    c.id,
                    c.display_label(),
                    c.description().unwrap_or(limits::UNKNOWN_DESCRIPTION),
                    if c.excluded { "   ***EXCLUDED***" } else { "" }
                )
            })
            .collect()
    }

    /// Emit the manifest to the log
    pub fn log_manifest(&self) {
        info!("Found {} sensors:", self.channels.len());
        for line in self.manifest() {
            info!("    {}", line);
        }
    }
}

fn probe_channel_count<F: PseudoFs + ?Sized>(fs: &F, device_path: &Path) -> u32 {
    let mut count = 0;
    while count < limits::MAX_SENSORS
        && fs.exists(&device_path.join(format!("temp{}_input", count + 1)))
    {
        count += 1;
    }
    if count == limits::MAX_SENSORS {
        warn!("Sensor probe stopped at the limit of {}", limits::MAX_SENSORS);
    }
    count
}

fn probe_actuators<F: PseudoFs + ?Sized>(fs: &F, device_path: &Path) -> Vec<Actuator> {
    let mut actuators = Vec::new();
    for index in 1..=limits::MAX_FANS {
        let min_path = device_path.join(format!("fan{}_min", index));
        let manual_path = device_path.join(format!("fan{}_manual", index));
        if !fs.exists(&min_path) || !fs.exists(&manual_path) {
            break;
        }
        debug!("Found fan {} at {:?}", index, min_path);
        actuators.push(Actuator {
            index,
            min_path,
            manual_path,
        });
    }
    actuators
}

fn read_label<F: PseudoFs + ?Sized>(fs: &F, path: &Path) -> String {
    match fs.read_prefix(path, limits::LABEL_MAX_LEN) {
        Ok(mut label) if !label.is_empty() => {
            if let Some(end) = label.rfind('\n') {
                label.truncate(end);
            }
            label
        }
        Ok(_) => {
            warn!(path = %path.display(), "Empty sensor label");
            String::new()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Can't read sensor label");
            String::new()
        }
    }
}
