pub mod cli;
pub mod settings;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli_args::CliConfig;

#[cfg(feature = "cli")]
mod cli_args {
    use crate::config::settings::SimulationSettings;
    use crate::core::profile::ControlProfile;
    use crate::core::ConfigProvider;
    use crate::domain::model::OutputFormat;
    use crate::utils::error::Result;
    use crate::utils::validation::{validate_path, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    /// Run length when neither `--duration` nor `--live` is given.
    const DEFAULT_DURATION_SECS: f64 = 30.0;

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "pit-lane-assist")]
    #[command(about = "Closed-loop pit lane speed control simulator")]
    pub struct CliConfig {
        #[arg(long, default_value = "vss", help = "Controller profile: vss, adaptive or classic")]
        pub profile: ControlProfile,

        #[arg(long, help = "Simulated seconds to run (unbounded in live mode)")]
        pub duration: Option<f64>,

        #[arg(long, help = "Initial setpoint in km/h (defaults to the profile slider)")]
        pub setpoint: Option<f64>,

        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        pub disturbance: f64,

        #[arg(long)]
        pub kp: Option<f64>,

        #[arg(long)]
        pub ki: Option<f64>,

        #[arg(long)]
        pub kd: Option<f64>,

        #[arg(long, help = "Pace ticks against the wall clock")]
        pub realtime: bool,

        #[arg(long, default_value = "1.0")]
        pub time_scale: f64,

        #[arg(long, help = "Read 'speed <kmh>', 'dist <rpm>' and 'quit' from stdin")]
        pub live: bool,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, value_delimiter = ',', default_value = "csv,json,svg")]
        pub formats: Vec<OutputFormat>,

        #[arg(long, default_value = "5")]
        pub log_every: u64,

        #[arg(long, help = "Keep only the newest N rows in trace.csv")]
        pub trace_limit: Option<usize>,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Log process CPU and memory usage")]
        pub monitor: bool,
    }

    impl ConfigProvider for CliConfig {
        fn settings(&self) -> Result<SimulationSettings> {
            let defaults = SimulationSettings::for_profile(self.profile);
            let gains = self.profile.default_gains();

            let duration_secs = match (self.duration, self.live) {
                (Some(secs), _) => Some(secs),
                (None, true) => None,
                (None, false) => Some(DEFAULT_DURATION_SECS),
            };

            let mut settings = SimulationSettings {
                duration_secs,
                setpoint_kmh: self.setpoint.unwrap_or(defaults.setpoint_kmh),
                disturbance_rpm: self.disturbance,
                gains: crate::core::controller::PidGains {
                    kp: self.kp.unwrap_or(gains.kp),
                    ki: self.ki.unwrap_or(gains.ki),
                    kd: self.kd.unwrap_or(gains.kd),
                },
                log_every: self.log_every,
                // operator input only makes sense at wall-clock pace
                realtime: self.realtime || self.live,
                time_scale: self.time_scale,
                live: self.live,
                trace_limit: self.trace_limit,
                output_formats: self.formats.clone(),
                ..defaults
            };
            // the live panel starts from its sliders
            if self.live {
                settings.snap_to_sliders();
            }
            Ok(settings)
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validate_path("output_path", &self.output_path)?;
            self.settings()?.validate()
        }
    }

}
