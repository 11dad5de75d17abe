//! Control law
//!
//! Maps temperatures onto a fan speed. Each control source (the average, the
//! maximum and the two primary channels) has a window `(floor, ceiling)` that
//! is linearly mapped onto a speed range. The fastest candidate wins.
//!
//! The interpolation factor is not clamped: below the floor a
//! candidate drops under the range minimum (and can never beat the seed), above
//! the ceiling it exceeds the maximum and is clamped at the end.

use std::fmt;

/// Which input determined the commanded speed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlSource {
    /// No source exceeded the minimum speed
    #[default]
    None,
    Average,
    Maximum,
    Primary1,
    Primary2,
}

impl fmt::Display for ControlSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlSource::None => "none",
            ControlSource::Average => "average",
            ControlSource::Maximum => "maximum",
            ControlSource::Primary1 => "primary 1",
            ControlSource::Primary2 => "primary 2",
        };
        f.write_str(name)
    }
}

/// Temperature range in °C mapped onto a speed range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlWindow {
    pub floor: f32,
    pub ceiling: f32,
}

impl ControlWindow {
    pub fn new(floor: f32, ceiling: f32) -> Self {
        Self { floor, ceiling }
    }

    /// Position of `value` inside the window: 0 at the floor, 1 at the ceiling
    pub fn normalize(&self, value: f32) -> f32 {
        (value - self.floor) / (self.ceiling - self.floor)
    }
}

/// Speed range in RPM
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FanRange {
    pub min: f32,
    pub max: f32,
}

/// All windows the control law evaluates. Built from a sanitized configuration,
/// so every window has `floor < ceiling`.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlWindows {
    pub average: ControlWindow,
    pub maximum: ControlWindow,
    /// Speed at the floor of the maximum window
    pub max_floor_speed: f32,
    /// Indexed by primary slot
    pub primary: [ControlWindow; 2],
    pub fan: FanRange,
}

/// Temperatures for one cycle. `None` marks a source that is not active.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlInputs {
    pub average: f32,
    pub maximum: Option<f32>,
    pub primary: [Option<f32>; 2],
}

/// Linear interpolation of `value` inside `window` onto `[low, high]`
pub fn candidate_speed(value: f32, window: &ControlWindow, low: f32, high: f32) -> f32 {
    low + window.normalize(value) * (high - low)
}

/// Compute the commanded speed and the source that determined it.
///
/// Sources are evaluated in the order average, maximum, primary 1, primary 2.
/// A candidate only replaces the current best when strictly greater, so on a
/// tie the earlier source is reported. The result never exceeds `fan.max`.
pub fn compute_speed(inputs: &ControlInputs, windows: &ControlWindows) -> (i32, ControlSource) {
    let fan = windows.fan;

    let candidates = [
        (
            ControlSource::Average,
            Some(candidate_speed(inputs.average, &windows.average, fan.min, fan.max)),
        ),
        (
            ControlSource::Maximum,
            inputs.maximum.map(|t| {
                candidate_speed(t, &windows.maximum, windows.max_floor_speed, fan.max)
            }),
        ),
        (
            ControlSource::Primary1,
            inputs.primary[0].map(|t| candidate_speed(t, &windows.primary[0], fan.min, fan.max)),
        ),
        (
            ControlSource::Primary2,
            inputs.primary[1].map(|t| candidate_speed(t, &windows.primary[1], fan.min, fan.max)),
        ),
    ];

    let mut best = fan.min;
    let mut source = ControlSource::None;
    for (candidate_source, candidate) in candidates {
        if let Some(speed) = candidate {
            if speed > best {
                best = speed;
                source = candidate_source;
            }
        }
    }

    (best.min(fan.max).round() as i32, source)
}
