use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Band the speed has to stay inside, expressed as offsets from the setpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBand {
    pub lower_offset: f64,
    pub upper_offset: f64,
}

impl TargetBand {
    pub fn bounds(&self, setpoint_kmh: f64) -> (f64, f64) {
        (setpoint_kmh + self.lower_offset, setpoint_kmh + self.upper_offset)
    }

    pub fn contains(&self, setpoint_kmh: f64, speed_kmh: f64) -> bool {
        let (min, max) = self.bounds(setpoint_kmh);
        min <= speed_kmh && speed_kmh <= max
    }
}

impl Default for TargetBand {
    fn default() -> Self {
        Self {
            lower_offset: -2.0,
            upper_offset: 1.0,
        }
    }
}

/// Operator input for a single tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TickInput {
    /// `None` keeps the current setpoint.
    pub setpoint_kmh: Option<f64>,
    pub disturbance_rpm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlContext {
    pub setpoint_kmh: f64,
    pub speed_kmh: f64,
    pub error_kmh: f64,
    pub band: (f64, f64),
    pub dt: f64,
}

impl ControlContext {
    pub fn in_band(&self) -> bool {
        self.band.0 <= self.speed_kmh && self.speed_kmh <= self.band.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ControlOutput {
    pub signal: f64,
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
    pub corrective: f64,
}

/// One row of the history and of the exported trace.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub time_s: f64,
    pub setpoint_kmh: f64,
    pub speed_kmh: f64,
    pub error_kmh: f64,
    pub error_volts: f64,
    pub control_signal: f64,
    pub control_volts: f64,
    pub disturbance_rpm: f64,
    pub attenuated_disturbance_rpm: f64,
    pub feedback_kmh: f64,
    pub proportional: f64,
    pub integral: f64,
    pub derivative: f64,
    pub corrective: f64,
    pub rpm_ctrl: f64,
    pub rpm_real: f64,
    pub in_band: bool,
}

/// A slider move applied once simulated time reaches `at_s`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledChange {
    pub at_s: f64,
    #[serde(default)]
    pub setpoint_kmh: Option<f64>,
    #[serde(default)]
    pub disturbance_rpm: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Csv,
    Json,
    Svg,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [OutputFormat::Csv, OutputFormat::Json, OutputFormat::Svg];

    pub fn file_name(&self) -> &'static str {
        match self {
            OutputFormat::Csv => "trace.csv",
            OutputFormat::Json => "summary.json",
            OutputFormat::Svg => "dashboard.svg",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            "svg" => Ok(OutputFormat::Svg),
            other => Err(format!(
                "Unsupported format '{}'. Valid formats: csv, json, svg",
                other
            )),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Csv => write!(f, "csv"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Svg => write!(f, "svg"),
        }
    }
}
