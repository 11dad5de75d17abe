//! Daemon configuration
//!
//! Two file formats are accepted:
//!
//! - the classic text format, one `name : integer` pair per line, with `#`
//!   comments and an `exclude : 3 7, 12` list of sensor ids;
//! - JSON, chosen when the path ends in `.json`, with the same key names.
//!
//! Missing keys take their defaults. After parsing, every value is clamped
//! into its valid range by [`FanConfig::sanitize`], which guarantees
//! `floor < ceiling` for every control window.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::constants::{config as limits, fan};
use crate::engine::control_law::{ControlWindow, ControlWindows, FanRange};
use crate::engine::sampling::AggregateOptions;
use crate::error::{Result, SmcfanError};

/// Effective daemon parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FanConfig {
    pub temp_avg_floor: u32,
    pub temp_avg_ceiling: u32,

    #[serde(rename = "temp_TC0P_floor")]
    pub temp_tc0p_floor: u32,
    #[serde(rename = "temp_TC0P_ceiling")]
    pub temp_tc0p_ceiling: u32,

    #[serde(rename = "temp_TG0P_floor")]
    pub temp_tg0p_floor: u32,
    #[serde(rename = "temp_TG0P_ceiling")]
    pub temp_tg0p_ceiling: u32,

    pub temp_max_floor: u32,
    pub temp_max_ceiling: u32,
    /// Speed demanded by the maximum source at `temp_max_floor`
    pub temp_max_fan_min: u32,

    pub fan_min: u32,
    pub fan_max: u32,

    /// 0 silent, 1 status line per cycle, 2 adds every sensor
    pub log_level: u8,

    /// Sensor ids (N in `tempN_input`) that are never sampled
    pub exclude: Vec<u32>,

    /// Accepts `true`/`false` or the text format's `0`/`1` in JSON
    #[serde(deserialize_with = "deserialize_flag")]
    pub outlier_rejection: bool,
    #[serde(deserialize_with = "deserialize_flag")]
    pub temp_max_control: bool,

    pub poll_interval_secs: u64,
}

impl Default for FanConfig {
    fn default() -> Self {
        Self {
            temp_avg_floor: limits::DEFAULT_AVG_FLOOR,
            temp_avg_ceiling: limits::DEFAULT_AVG_CEILING,
            temp_tc0p_floor: limits::DEFAULT_TC0P_FLOOR,
            temp_tc0p_ceiling: limits::DEFAULT_TC0P_CEILING,
            temp_tg0p_floor: limits::DEFAULT_TG0P_FLOOR,
            temp_tg0p_ceiling: limits::DEFAULT_TG0P_CEILING,
            temp_max_floor: limits::DEFAULT_MAX_FLOOR,
            temp_max_ceiling: limits::DEFAULT_MAX_CEILING,
            temp_max_fan_min: limits::DEFAULT_MAX_FAN_MIN,
            fan_min: limits::DEFAULT_FAN_MIN,
            fan_max: limits::DEFAULT_FAN_MAX,
            log_level: 0,
            exclude: Vec::new(),
            outlier_rejection: false,
            temp_max_control: true,
            poll_interval_secs: limits::DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

/// Clamp a window so that `floor < ceiling`
fn clamp_window(floor: &mut u32, ceiling: &mut u32) {
    *ceiling = (*ceiling).clamp(limits::MIN_CEILING, limits::MAX_CEILING);
    *floor = (*floor).min(*ceiling - 1);
}

impl FanConfig {
    /// Clamp every value into its valid range
    pub fn sanitize(mut self) -> Self {
        clamp_window(&mut self.temp_avg_floor, &mut self.temp_avg_ceiling);
        clamp_window(&mut self.temp_tc0p_floor, &mut self.temp_tc0p_ceiling);
        clamp_window(&mut self.temp_tg0p_floor, &mut self.temp_tg0p_ceiling);
        clamp_window(&mut self.temp_max_floor, &mut self.temp_max_ceiling);

        self.fan_max = self.fan_max.clamp(1, fan::SPEED_LIMIT);
        self.fan_min = self.fan_min.min(self.fan_max);
        self.temp_max_fan_min = self.temp_max_fan_min.clamp(self.fan_min, self.fan_max);

        self.log_level = self.log_level.min(limits::MAX_LOG_LEVEL);
        self.poll_interval_secs = self
            .poll_interval_secs
            .clamp(limits::MIN_POLL_INTERVAL_SECS, limits::MAX_POLL_INTERVAL_SECS);

        self.exclude.retain(|&id| id > 0);
        if self.exclude.len() > limits::MAX_EXCLUDE {
            warn!("Exclude list truncated to {} entries", limits::MAX_EXCLUDE);
            self.exclude.truncate(limits::MAX_EXCLUDE);
        }
        self
    }

    /// Control-law windows for this configuration
    pub fn windows(&self) -> ControlWindows {
        let window = |floor: u32, ceiling: u32| ControlWindow::new(floor as f32, ceiling as f32);
        ControlWindows {
            average: window(self.temp_avg_floor, self.temp_avg_ceiling),
            maximum: window(self.temp_max_floor, self.temp_max_ceiling),
            max_floor_speed: self.temp_max_fan_min as f32,
            primary: [
                window(self.temp_tc0p_floor, self.temp_tc0p_ceiling),
                window(self.temp_tg0p_floor, self.temp_tg0p_ceiling),
            ],
            fan: FanRange {
                min: self.fan_min as f32,
                max: self.fan_max as f32,
            },
        }
    }

    pub fn aggregate_options(&self) -> AggregateOptions {
        AggregateOptions {
            outlier_rejection: self.outlier_rejection,
            track_maximum: self.temp_max_control,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    /// Log the effective parameters
    pub fn log_parameters(&self) {
        info!("Using parameters:");
        info!("    temp_avg_floor: {}", self.temp_avg_floor);
        info!("    temp_avg_ceiling: {}", self.temp_avg_ceiling);
        info!("    temp_max_floor: {}", self.temp_max_floor);
        info!("    temp_max_ceiling: {}", self.temp_max_ceiling);
        info!("    temp_max_fan_min: {}", self.temp_max_fan_min);
        info!("    temp_TC0P_floor: {}", self.temp_tc0p_floor);
        info!("    temp_TC0P_ceiling: {}", self.temp_tc0p_ceiling);
        info!("    temp_TG0P_floor: {}", self.temp_tg0p_floor);
        info!("    temp_TG0P_ceiling: {}", self.temp_tg0p_ceiling);
        info!("    fan_min: {}", self.fan_min);
        info!("    fan_max: {}", self.fan_max);
        if !self.exclude.is_empty() {
            let ids: Vec<String> = self
                .exclude
                .iter()
                .map(|id| format!("temp{}_input", id))
                .collect();
            info!("    exclude: {}", ids.join(" "));
        }
        info!("    outlier_rejection: {}", u8::from(self.outlier_rejection));
        info!("    temp_max_control: {}", u8::from(self.temp_max_control));
        info!("    poll_interval_secs: {}", self.poll_interval_secs);
        info!("    log_level: {}", self.log_level);
    }
}

// ============================================================================
// Text format
// ============================================================================

/// Split a line into name and value; `None` for comments and blank lines
fn split_line(line: &str) -> Option<std::result::Result<(&str, &str), ()>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(
        trimmed
            .split_once(':')
            .map(|(name, value)| (name.trim(), value.trim()))
            .ok_or(()),
    )
}

fn parse_exclude_list(value: &str, line: &str) -> Vec<u32> {
    let mut ids = Vec::new();
    for token in value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match token.parse::<u32>() {
            Ok(id) if ids.len() < limits::MAX_EXCLUDE => ids.push(id),
            Ok(_) => {
                warn!("Too many excluded sensors, ignoring the rest: {}", line);
                break;
            }
            Err(_) => {
                warn!("Malformed exclude list in config file: {}", line);
                break;
            }
        }
    }
    ids
}

/// Parse the text format. Unknown keys are ignored; for repeated keys the
/// first well-formed line wins.
pub fn parse_config_text(content: &str) -> FanConfig {
    let mut values: Vec<(&str, u64)> = Vec::new();
    let mut exclude: Option<Vec<u32>> = None;

    for line in content.lines() {
        let (name, value) = match split_line(line) {
            None => continue,
            Some(Ok(pair)) => pair,
            Some(Err(())) => {
                warn!("Ill formed line in config file: {}", line);
                continue;
            }
        };

        if name == "exclude" {
            if exclude.is_none() {
                exclude = Some(parse_exclude_list(value, line));
            }
            continue;
        }

        match value.parse::<u64>() {
            Ok(v) => {
                if !values.iter().any(|(n, _)| *n == name) {
                    values.push((name, v));
                }
            }
            Err(_) => warn!("Ill formed line in config file: {}", line),
        }
    }

    let defaults = FanConfig::default();
    let get = |key: &str| values.iter().find(|(n, _)| *n == key).map(|(_, v)| *v);
    let get_u32 = |key: &str, default: u32| {
        get(key).map_or(default, |v| u32::try_from(v).unwrap_or(u32::MAX))
    };

    for (name, _) in &values {
        if !KNOWN_KEYS.contains(name) {
            debug!("Ignoring unknown config key {:?}", name);
        }
    }

    FanConfig {
        temp_avg_floor: get_u32("temp_avg_floor", defaults.temp_avg_floor),
        temp_avg_ceiling: get_u32("temp_avg_ceiling", defaults.temp_avg_ceiling),
        temp_tc0p_floor: get_u32("temp_TC0P_floor", defaults.temp_tc0p_floor),
        temp_tc0p_ceiling: get_u32("temp_TC0P_ceiling", defaults.temp_tc0p_ceiling),
        temp_tg0p_floor: get_u32("temp_TG0P_floor", defaults.temp_tg0p_floor),
        temp_tg0p_ceiling: get_u32("temp_TG0P_ceiling", defaults.temp_tg0p_ceiling),
        temp_max_floor: get_u32("temp_max_floor", defaults.temp_max_floor),
        temp_max_ceiling: get_u32("temp_max_ceiling", defaults.temp_max_ceiling),
        temp_max_fan_min: get_u32("temp_max_fan_min", defaults.temp_max_fan_min),
        fan_min: get_u32("fan_min", defaults.fan_min),
        fan_max: get_u32("fan_max", defaults.fan_max),
        log_level: get("log_level").map_or(defaults.log_level, |v| {
            u8::try_from(v).unwrap_or(u8::MAX)
        }),
        exclude: exclude.unwrap_or_default(),
        outlier_rejection: get("outlier_rejection").map_or(defaults.outlier_rejection, |v| v > 0),
        temp_max_control: get("temp_max_control").map_or(defaults.temp_max_control, |v| v > 0),
        poll_interval_secs: get("poll_interval_secs").unwrap_or(defaults.poll_interval_secs),
    }
    .sanitize()
}

const KNOWN_KEYS: &[&str] = &[
    "temp_avg_floor",
    "temp_avg_ceiling",
    "temp_TC0P_floor",
    "temp_TC0P_ceiling",
    "temp_TG0P_floor",
    "temp_TG0P_ceiling",
    "temp_max_floor",
    "temp_max_ceiling",
    "temp_max_fan_min",
    "fan_min",
    "fan_max",
    "log_level",
    "outlier_rejection",
    "temp_max_control",
    "poll_interval_secs",
];

// ============================================================================
// JSON format
// ============================================================================

/// Flag field: a JSON bool, or an integer where anything above 0 is set
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct FlagVisitor;

    impl<'de> Visitor<'de> for FlagVisitor {
        type Value = bool;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a boolean or a non-negative integer")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<bool, E> {
            Ok(value > 0)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<bool, E> {
            u64::try_from(value)
                .map(|v| v > 0)
                .map_err(|_| E::custom(format!("negative flag value: {}", value)))
        }
    }

    deserializer.deserialize_any(FlagVisitor)
}

pub fn parse_config_json(content: &str) -> Result<FanConfig> {
    let config: FanConfig = serde_json::from_str(content)?;
    Ok(config.sanitize())
}

/// Load the configuration at `path`.
///
/// A missing file yields the defaults. Only a file that exists but cannot be
/// read, or malformed JSON, is an error.
pub fn load_config(path: &Path) -> Result<FanConfig> {
    if !path.exists() {
        warn!("Could not open config file {}, using defaults", path.display());
        return Ok(FanConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|source| SmcfanError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let is_json = path
        .extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if is_json {
        parse_config_json(&content)
    } else {
        Ok(parse_config_text(&content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = FanConfig::default();
        assert_eq!(config.temp_avg_floor, 40);
        assert_eq!(config.temp_avg_ceiling, 50);
        assert_eq!(config.temp_tc0p_floor, 50);
        assert_eq!(config.temp_tc0p_ceiling, 65);
        assert_eq!(config.temp_tg0p_floor, 65);
        assert_eq!(config.temp_tg0p_ceiling, 80);
        assert_eq!(config.temp_max_fan_min, 4000);
        assert_eq!(config.fan_max, 6200);
        assert!(config.temp_max_control);
        assert!(!config.outlier_rejection);
        // defaults are already sane
        assert_eq!(config.clone().sanitize(), config);
    }

    #[test]
    fn test_parse_text() {
        let text = "\
# smcfan configuration
temp_avg_floor: 45
temp_avg_ceiling: 55

  temp_TC0P_floor :  40
temp_TC0P_ceiling: 50
fan_min: 2000
log_level: 1
exclude: 3 7, 12
outlier_rejection: 1
";
        let config = parse_config_text(text);
        assert_eq!(config.temp_avg_floor, 45);
        assert_eq!(config.temp_avg_ceiling, 55);
        assert_eq!(config.temp_tc0p_floor, 40);
        assert_eq!(config.temp_tc0p_ceiling, 50);
        assert_eq!(config.temp_tg0p_floor, 65);
        assert_eq!(config.fan_min, 2000);
        assert_eq!(config.log_level, 1);
        assert_eq!(config.exclude, vec![3, 7, 12]);
        assert!(config.outlier_rejection);
        assert!(config.temp_max_control);
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let text = "\
fan_min 1500
fan_min: fast
fan_min: -3
fan_min: 1000
fan_min: 3000
";
        let config = parse_config_text(text);
        assert_eq!(config.fan_min, 1000);
    }

    #[test]
    fn test_values_are_clamped() {
        let text = "\
temp_avg_ceiling: 150
temp_avg_floor: 120
temp_TC0P_ceiling: 0
fan_min: 9000
temp_max_fan_min: 10
log_level: 7
poll_interval_secs: 0
";
        let config = parse_config_text(text);
        assert_eq!(config.temp_avg_ceiling, 90);
        assert_eq!(config.temp_avg_floor, 89);
        assert_eq!(config.temp_tc0p_ceiling, 1);
        assert_eq!(config.temp_tc0p_floor, 0);
        assert_eq!(config.fan_min, 6200);
        assert_eq!(config.temp_max_fan_min, 6200);
        assert_eq!(config.log_level, 2);
        assert_eq!(config.poll_interval_secs, 1);
    }

    #[test]
    fn test_default_floor_follows_lowered_ceiling() {
        let config = parse_config_text("temp_avg_ceiling: 30\n");
        assert_eq!(config.temp_avg_ceiling, 30);
        assert_eq!(config.temp_avg_floor, 29);
    }

    #[test]
    fn test_exclude_list_limits() {
        let many: Vec<String> = (1..=25).map(|i| i.to_string()).collect();
        let config = parse_config_text(&format!("exclude: {}\n", many.join(" ")));
        assert_eq!(config.exclude.len(), 20);
        assert_eq!(config.exclude[19], 20);

        let config = parse_config_text("exclude: 4, 5 x 6\nexclude: 9\n");
        assert_eq!(config.exclude, vec![4, 5]);

        let config = parse_config_text("exclude: 0 2\n");
        assert_eq!(config.exclude, vec![2]);
    }

    #[test]
    fn test_windows_always_open() {
        let text = "temp_max_ceiling: 20\ntemp_max_floor: 20\n";
        let windows = parse_config_text(text).windows();
        assert!(windows.maximum.floor < windows.maximum.ceiling);
        assert_eq!(windows.maximum.ceiling, 20.0);
        assert_eq!(windows.maximum.floor, 19.0);
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{
            "temp_TC0P_floor": 40,
            "temp_TC0P_ceiling": 50,
            "exclude": [2, 5],
            "temp_max_control": false,
            "fan_min": 8000
        }"#;
        let config = parse_config_json(json).unwrap();
        assert_eq!(config.temp_tc0p_floor, 40);
        assert_eq!(config.temp_tc0p_ceiling, 50);
        assert_eq!(config.exclude, vec![2, 5]);
        assert!(!config.temp_max_control);
        assert_eq!(config.fan_min, 6200);
        assert_eq!(config.temp_avg_floor, 40);
    }

    #[test]
    fn test_parse_json_integer_flags() {
        let config = parse_config_json(r#"{"outlier_rejection": 1, "temp_max_control": 0}"#).unwrap();
        assert!(config.outlier_rejection);
        assert!(!config.temp_max_control);

        let text = parse_config_text("outlier_rejection: 1\ntemp_max_control: 0\n");
        assert_eq!(config, text);

        let config = parse_config_json(r#"{"outlier_rejection": 3, "temp_max_control": true}"#).unwrap();
        assert!(config.outlier_rejection);
        assert!(config.temp_max_control);

        assert!(parse_config_json(r#"{"outlier_rejection": -1}"#).is_err());
        assert!(parse_config_json(r#"{"temp_max_control": "yes"}"#).is_err());
    }

    #[test]
    fn test_parse_json_invalid() {
        let err = parse_config_json("{ not json").unwrap_err();
        assert!(matches!(err, SmcfanError::JsonParse(_)));
    }

    #[test]
    fn test_load_config_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("smcfan.conf")).unwrap();
        assert_eq!(config, FanConfig::default());
    }

    #[test]
    fn test_load_config_by_extension() {
        let temp_dir = TempDir::new().unwrap();

        let text_path = temp_dir.path().join("smcfan.conf");
        fs::write(&text_path, "log_level: 2\n").unwrap();
        assert_eq!(load_config(&text_path).unwrap().log_level, 2);

        let json_path = temp_dir.path().join("smcfan.json");
        fs::write(&json_path, r#"{"log_level": 1}"#).unwrap();
        assert_eq!(load_config(&json_path).unwrap().log_level, 1);

        fs::write(&json_path, "log_level: 1").unwrap();
        assert!(load_config(&json_path).is_err());
    }

    #[test]
    fn test_derived_settings() {
        let config = FanConfig {
            outlier_rejection: true,
            temp_max_control: false,
            poll_interval_secs: 3,
            ..FanConfig::default()
        };
        assert_eq!(
            config.aggregate_options(),
            AggregateOptions {
                outlier_rejection: true,
                track_maximum: false
            }
        );
        assert_eq!(config.poll_interval(), Duration::from_secs(3));

        let windows = config.windows();
        assert_eq!(windows.max_floor_speed, 4000.0);
        assert_eq!(windows.primary[1], ControlWindow::new(65.0, 80.0));
        assert_eq!(windows.fan.max, 6200.0);
    }
}
