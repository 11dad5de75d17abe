//! Human-readable names for SMC temperature keys

/// Known SMC temperature keys and what they measure
pub static SENSOR_DESCRIPTIONS: &[(&str, &str)] = &[
    ("TA0P", "Ambient Air Temp"),
    ("TB0T", "Battery TS_MAX Temp"),
    ("TB1T", "Battery TS1 Temp"),
    ("TB2T", "Battery TS2 Temp"),
    ("TB3T", "Battery Temp"),
    ("TC0D", "CPU 0 Die Temp"),
    ("TC0P", "CPU 0 Proximity Temp"),
    ("TG0D", "GPU Die - Digital"),
    ("TG0P", "GPU 0 Proximity Temp"),
    ("TG0T", "GPU 0 Die - Analog Temp"),
    ("TG0H", "Left Heat Pipe/Fin Stack Proximity Temp"),
    ("TG1H", "Left Heat Pipe/Fin Stack Proximity Temp"),
    ("TN0P", "MCP Proximity"),
    ("TN0D", "MCP Die"),
    ("Th0H", "Temperature NB/CPU/GPU HeatPipe 0 Proximity"),
    ("Th1H", "Temperature NB/CPU/GPU HeatPipe 1 Proximity"),
    ("Th2H", "Right Fin Stack Proximity Temp"),
    ("TM0P", "Temperature FBDIMM Riser A incoming air Temp"),
    ("Tm0P", "Battery Charger Proximity Temp"),
    ("Ts0P", "Left Palm Rest Temp"),
    ("Ts1P", "Right Palm Rest Temp"),
];

/// Look up the description for an exact (case-sensitive) label
pub fn describe(label: &str) -> Option<&'static str> {
    SENSOR_DESCRIPTIONS
        .iter()
        .find(|(key, _)| *key == label)
        .map(|(_, desc)| *desc)
}
