use crate::config::settings::{SimulationSettings, DEFAULT_DT, DEFAULT_LOG_EVERY};
use crate::core::controller::PidGains;
use crate::core::history::DEFAULT_CAPACITY;
use crate::core::profile::ControlProfile;
use crate::core::ConfigProvider;
use crate::domain::model::{OutputFormat, ScheduledChange};
use crate::utils::error::{Result, SimError};
use crate::utils::validation::{validate_path, validate_required_field, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub simulation: SimulationSection,
    pub controller: Option<ControllerSection>,
    #[serde(default)]
    pub schedule: Vec<ScheduledChange>,
    pub output: OutputSection,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationSection {
    pub name: Option<String>,
    #[serde(default)]
    pub profile: ControlProfile,
    pub duration_secs: Option<f64>,
    pub dt: Option<f64>,
    pub setpoint_kmh: Option<f64>,
    pub disturbance_rpm: Option<f64>,
    pub history_capacity: Option<usize>,
    pub log_every: Option<u64>,
    pub realtime: Option<bool>,
    pub time_scale: Option<f64>,
}

/// Gain overrides; missing gains fall back to the profile's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControllerSection {
    pub kp: Option<f64>,
    pub ki: Option<f64>,
    pub kd: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub formats: Option<Vec<String>>,
    pub trace_limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub log_level: Option<String>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(SimError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| SimError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replaces `${VAR}` with the environment value; unknown names are left as is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| SimError::ProcessingError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_path("output.path", &self.output.path)?;
        validate_required_field("simulation.duration_secs", &self.simulation.duration_secs)?;
        self.output_formats()?;
        self.settings()?.validate()
    }

    pub fn output_formats(&self) -> Result<Vec<OutputFormat>> {
        let Some(formats) = &self.output.formats else {
            return Ok(OutputFormat::ALL.to_vec());
        };

        formats
            .iter()
            .map(|raw| {
                raw.parse::<OutputFormat>()
                    .map_err(|reason| SimError::InvalidConfigValueError {
                        field: "output.formats".to_string(),
                        value: raw.clone(),
                        reason,
                    })
            })
            .collect()
    }

    pub fn name(&self) -> &str {
        self.simulation.name.as_deref().unwrap_or("unnamed scenario")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn settings(&self) -> Result<SimulationSettings> {
        let sim = &self.simulation;
        let profile = sim.profile;
        let defaults = profile.default_gains();
        let gains = match &self.controller {
            Some(c) => PidGains {
                kp: c.kp.unwrap_or(defaults.kp),
                ki: c.ki.unwrap_or(defaults.ki),
                kd: c.kd.unwrap_or(defaults.kd),
            },
            None => defaults,
        };

        let mut settings = SimulationSettings {
            profile,
            dt: sim.dt.unwrap_or(DEFAULT_DT),
            duration_secs: sim.duration_secs,
            setpoint_kmh: sim
                .setpoint_kmh
                .unwrap_or_else(|| profile.setpoint_slider().value()),
            disturbance_rpm: sim.disturbance_rpm.unwrap_or(0.0),
            gains,
            history_capacity: sim.history_capacity.unwrap_or(DEFAULT_CAPACITY),
            log_every: sim.log_every.unwrap_or(DEFAULT_LOG_EVERY),
            realtime: sim.realtime.unwrap_or(false),
            time_scale: sim.time_scale.unwrap_or(1.0),
            live: false,
            trace_limit: self.output.trace_limit,
            output_formats: self.output_formats()?,
            schedule: self.schedule.clone(),
        };
        // scenarios replay slider moves, the starting position included
        settings.snap_to_sliders();
        Ok(settings)
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
