//! Per-cycle status line

use std::fmt::Write;
use tracing::info;

use super::control_law::ControlSource;
use super::ControlState;
use crate::constants::registry::PRIMARY_LABELS;
use crate::hw::registry::Registry;

fn marker(state: &ControlState, source: ControlSource) -> char {
    if state.source == source {
        '*'
    } else {
        ' '
    }
}

/// Render the status line for `state`, or `None` when reporting is off.
///
/// The winning source is marked with `*`. At level 2 and above every active
/// channel's reading is appended.
pub fn format_report(state: &ControlState, registry: &Registry, log_level: u8) -> Option<String> {
    if log_level == 0 {
        return None;
    }

    let mut line = format!(
        "Speed: {}, {}AVG: {:.1}C",
        state.speed,
        marker(state, ControlSource::Average),
        state.average
    );

    if let Some(max) = state.maximum {
        let _ = write!(
            line,
            ", {}MAX: {:.1}C",
            marker(state, ControlSource::Maximum),
            max
        );
    }

    let slots = [ControlSource::Primary1, ControlSource::Primary2];
    for (slot, source) in slots.into_iter().enumerate() {
        if let Some(value) = state.primary[slot] {
            let _ = write!(
                line,
                ", {}{}: {:.1}C",
                marker(state, source),
                PRIMARY_LABELS[slot],
                value
            );
        }
    }

    if log_level >= 2 {
        line.push_str(", Sensors:");
        for channel in registry.active_channels() {
            let _ = write!(line, " {}:{:.0}", channel.display_label(), channel.value);
        }
    }

    Some(line)
}

/// Emit the status line for this cycle
pub fn report(state: &ControlState, registry: &Registry, log_level: u8) {
    if let Some(line) = format_report(state, registry, log_level) {
        info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::fs::SysFs;
    use crate::test_utils::MockSmcDevice;

    fn fixture() -> (MockSmcDevice, Registry) {
        let device = MockSmcDevice::new()
            .sensor("TC0P", 45_000)
            .sensor("TG0P", 41_000)
            .sensor("TB0T", 30_000)
            .fans(1);
        let mut registry = Registry::discover(&SysFs, device.path(), &[3]).unwrap();
        crate::engine::sampling::sample(&SysFs, registry.channels_mut());
        (device, registry)
    }

    fn state() -> ControlState {
        ControlState {
            average: 45.0,
            maximum: Some(47.0),
            primary: [Some(45.0), Some(41.0)],
            speed: 3100,
            source: ControlSource::Primary1,
            soft_excluded: Vec::new(),
        }
    }

    #[test]
    fn test_silent_at_level_zero() {
        let (_device, registry) = fixture();
        assert_eq!(format_report(&state(), &registry, 0), None);
    }

    #[test]
    fn test_marks_winning_source() {
        let (_device, registry) = fixture();
        let line = format_report(&state(), &registry, 1).unwrap();
        assert_eq!(
            line,
            "Speed: 3100,  AVG: 45.0C,  MAX: 47.0C, *TC0P: 45.0C,  TG0P: 41.0C"
        );

        let avg = ControlState {
            source: ControlSource::Average,
            ..state()
        };
        let line = format_report(&avg, &registry, 1).unwrap();
        assert!(line.starts_with("Speed: 3100, *AVG: 45.0C,  MAX"));
    }

    #[test]
    fn test_omits_absent_sources() {
        let (_device, registry) = fixture();
        let s = ControlState {
            maximum: None,
            primary: [None, Some(41.0)],
            source: ControlSource::None,
            ..state()
        };
        let line = format_report(&s, &registry, 1).unwrap();
        assert_eq!(line, "Speed: 3100,  AVG: 45.0C,  TG0P: 41.0C");
    }

    #[test]
    fn test_verbose_lists_active_channels() {
        let (_device, registry) = fixture();
        let line = format_report(&state(), &registry, 2).unwrap();
        assert!(line.ends_with(", Sensors: TC0P:45 TG0P:41"));
        assert!(!line.contains("TB0T"));
    }
}
