use crate::core::controller::PidGains;
use crate::core::history::DEFAULT_CAPACITY;
use crate::core::profile::ControlProfile;
use crate::domain::model::{OutputFormat, ScheduledChange};
use crate::utils::error::{Result, SimError};
use crate::utils::validation::{
    validate_positive_f64, validate_positive_number, validate_range, Validate,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_DT: f64 = 0.1;
pub const DEFAULT_LOG_EVERY: u64 = 5;
/// Longest wall-clock wait between two paced ticks.
pub const MAX_PACING_PERIOD: Duration = Duration::from_secs(60);

/// Everything the engine needs for one run, whichever front end built it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationSettings {
    pub profile: ControlProfile,
    pub dt: f64,
    /// `None` runs until the input source stops (live mode).
    pub duration_secs: Option<f64>,
    pub setpoint_kmh: f64,
    pub disturbance_rpm: f64,
    pub gains: PidGains,
    pub history_capacity: usize,
    pub log_every: u64,
    pub realtime: bool,
    pub time_scale: f64,
    pub live: bool,
    /// Keep only the newest N rows of the exported trace.
    pub trace_limit: Option<usize>,
    pub output_formats: Vec<OutputFormat>,
    pub schedule: Vec<ScheduledChange>,
}

impl SimulationSettings {
    pub fn for_profile(profile: ControlProfile) -> Self {
        Self {
            profile,
            dt: DEFAULT_DT,
            duration_secs: Some(30.0),
            setpoint_kmh: profile.setpoint_slider().value(),
            disturbance_rpm: 0.0,
            gains: profile.default_gains(),
            history_capacity: DEFAULT_CAPACITY,
            log_every: DEFAULT_LOG_EVERY,
            realtime: false,
            time_scale: 1.0,
            live: false,
            trace_limit: None,
            output_formats: OutputFormat::ALL.to_vec(),
            schedule: Vec::new(),
        }
    }

    /// Number of ticks the run is allowed to take, if bounded.
    pub fn max_ticks(&self) -> Option<u64> {
        self.duration_secs
            .map(|secs| (secs / self.dt).round().max(0.0) as u64)
    }

    /// Wall-clock time between two ticks in real-time mode.
    pub fn pacing_period(&self) -> Result<Duration> {
        let invalid = |reason: &str| SimError::InvalidConfigValueError {
            field: "simulation.time_scale".to_string(),
            value: self.time_scale.to_string(),
            reason: reason.to_string(),
        };

        let period = Duration::try_from_secs_f64(self.dt / self.time_scale)
            .map_err(|_| invalid("dt / time_scale is not a representable duration"))?;
        if period.is_zero() {
            return Err(invalid("dt / time_scale rounds to a zero pacing period"));
        }
        if period > MAX_PACING_PERIOD {
            return Err(invalid(&format!(
                "dt / time_scale exceeds the {}s pacing limit",
                MAX_PACING_PERIOD.as_secs()
            )));
        }
        Ok(period)
    }

    /// Moves the initial setpoint and disturbance onto the profile sliders,
    /// the same way operator input is quantised.
    pub fn snap_to_sliders(&mut self) {
        self.setpoint_kmh = self.profile.setpoint_slider().set(self.setpoint_kmh);
        self.disturbance_rpm = self.profile.disturbance_slider().set(self.disturbance_rpm);
    }
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self::for_profile(ControlProfile::default())
    }
}

impl Validate for SimulationSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_f64("simulation.dt", self.dt)?;
        validate_positive_f64("simulation.time_scale", self.time_scale)?;
        if self.realtime {
            self.pacing_period()?;
        }
        if let Some(duration) = self.duration_secs {
            validate_positive_f64("simulation.duration_secs", duration)?;
        } else if !self.live {
            return Err(SimError::MissingConfigError {
                field: "simulation.duration_secs".to_string(),
            });
        }

        let plant = self.profile.plant_params();
        validate_range(
            "simulation.setpoint_kmh",
            self.setpoint_kmh,
            plant.speed_min_kmh,
            plant.speed_max_kmh,
        )?;
        validate_range(
            "simulation.disturbance_rpm",
            self.disturbance_rpm,
            -10_000.0,
            10_000.0,
        )?;

        for (name, gain) in [
            ("controller.kp", self.gains.kp),
            ("controller.ki", self.gains.ki),
            ("controller.kd", self.gains.kd),
        ] {
            validate_range(name, gain, 0.0, 1_000.0)?;
        }

        validate_positive_number("simulation.history_capacity", self.history_capacity, 2)?;
        validate_positive_number("simulation.log_every", self.log_every as usize, 1)?;
        if let Some(limit) = self.trace_limit {
            validate_positive_number("output.trace_limit", limit, 1)?;
        }

        let mut previous = f64::NEG_INFINITY;
        for (i, change) in self.schedule.iter().enumerate() {
            let field = format!("schedule[{}].at_s", i);
            validate_range(&field, change.at_s, 0.0, f64::MAX)?;
            if change.at_s < previous {
                return Err(SimError::InvalidConfigValueError {
                    field,
                    value: change.at_s.to_string(),
                    reason: "Schedule entries must be sorted by time".to_string(),
                });
            }
            previous = change.at_s;
        }

        Ok(())
    }
}
