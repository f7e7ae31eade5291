pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod report;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::CliConfig;

pub use crate::app::inputs::{ConstantInput, ControlPanel, LiveInput, ScheduledInput};
pub use crate::config::{cli::LocalStorage, settings::SimulationSettings, toml_config::TomlConfig};
pub use crate::core::{profile::ControlProfile, RunReport, SimulationEngine, SpeedControlSystem};
pub use crate::report::RunSummary;
pub use crate::utils::error::{Result, SimError};
