use crate::app::inputs::slider::Slider;
use crate::core::controller::{AdaptiveController, ClassicPid, PidGains};
use crate::core::plant::PlantParams;
use crate::domain::ports::Controller;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which error signal the controller is fed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorInput {
    /// VSS voltage difference, converted back to km/h.
    Volts,
    /// Plain setpoint minus speed.
    Kmh,
}

/// Controller and plant presets.
///
/// - `Vss`: adaptive controller fed through the 0-5 V speed sensor, attenuated
///   disturbance, setpoint adjustable between 60 and 80 km/h.
/// - `Adaptive`: same loop working directly in km/h, setpoint up to 100 km/h.
/// - `Classic`: plain PID on a wider RPM range with the raw disturbance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlProfile {
    #[default]
    Vss,
    Adaptive,
    Classic,
}

impl ControlProfile {
    pub fn error_input(&self) -> ErrorInput {
        match self {
            ControlProfile::Vss => ErrorInput::Volts,
            ControlProfile::Adaptive | ControlProfile::Classic => ErrorInput::Kmh,
        }
    }

    pub fn default_gains(&self) -> PidGains {
        match self {
            ControlProfile::Vss | ControlProfile::Adaptive => AdaptiveController::DEFAULT_GAINS,
            ControlProfile::Classic => ClassicPid::DEFAULT_GAINS,
        }
    }

    pub fn build_controller(&self, gains: PidGains, initial_speed_kmh: f64) -> Box<dyn Controller> {
        match self {
            ControlProfile::Vss | ControlProfile::Adaptive => {
                Box::new(AdaptiveController::new(gains, initial_speed_kmh))
            }
            ControlProfile::Classic => Box::new(ClassicPid::new(gains)),
        }
    }

    pub fn plant_params(&self) -> PlantParams {
        match self {
            ControlProfile::Vss | ControlProfile::Adaptive => PlantParams {
                rpm_nominal: 5500.0,
                rpm_min: 4700.0,
                rpm_max: 6300.0,
                speed_min_kmh: 50.0,
                speed_max_kmh: 100.0,
                base_gain: 18.0,
                out_of_band_boost: 1.3,
                disturbance_min_rpm: -100.0,
                disturbance_max_rpm: 200.0,
                disturbance_attenuation: 0.3,
                initial_speed_kmh: 70.0,
                initial_rpm: 4812.0,
            },
            ControlProfile::Classic => PlantParams {
                rpm_nominal: 5500.0,
                rpm_min: 4000.0,
                rpm_max: 7000.0,
                speed_min_kmh: 50.0,
                speed_max_kmh: 100.0,
                base_gain: 25.0,
                out_of_band_boost: 1.0,
                disturbance_min_rpm: -300.0,
                disturbance_max_rpm: 300.0,
                disturbance_attenuation: 1.0,
                initial_speed_kmh: 70.0,
                initial_rpm: 4812.0,
            },
        }
    }

    pub fn setpoint_slider(&self) -> Slider {
        match self {
            ControlProfile::Vss => Slider::new(60.0, 80.0, 1.0, 80.0),
            ControlProfile::Adaptive | ControlProfile::Classic => {
                Slider::new(60.0, 100.0, 1.0, 80.0)
            }
        }
    }

    pub fn disturbance_slider(&self) -> Slider {
        match self {
            ControlProfile::Vss | ControlProfile::Adaptive => Slider::new(-100.0, 200.0, 10.0, 0.0),
            ControlProfile::Classic => Slider::new(-300.0, 300.0, 10.0, 0.0),
        }
    }
}

impl FromStr for ControlProfile {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vss" => Ok(ControlProfile::Vss),
            "adaptive" => Ok(ControlProfile::Adaptive),
            "classic" => Ok(ControlProfile::Classic),
            other => Err(format!(
                "Unknown profile '{}'. Valid profiles: vss, adaptive, classic",
                other
            )),
        }
    }
}

impl fmt::Display for ControlProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlProfile::Vss => write!(f, "vss"),
            ControlProfile::Adaptive => write!(f, "adaptive"),
            ControlProfile::Classic => write!(f, "classic"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_round_trips_through_str() {
        for profile in [ControlProfile::Vss, ControlProfile::Adaptive, ControlProfile::Classic] {
            assert_eq!(profile.to_string().parse::<ControlProfile>().unwrap(), profile);
        }
        assert!("fuzzy".parse::<ControlProfile>().is_err());
    }

    #[test]
    fn test_presets() {
        assert_eq!(ControlProfile::Vss.error_input(), ErrorInput::Volts);
        assert_eq!(ControlProfile::Classic.error_input(), ErrorInput::Kmh);
        assert_eq!(ControlProfile::Classic.default_gains().kp, 2.0);
        assert_eq!(ControlProfile::Vss.plant_params().rpm_min, 4700.0);
        assert_eq!(ControlProfile::Vss.setpoint_slider().max(), 80.0);
        assert_eq!(ControlProfile::Classic.disturbance_slider().min(), -300.0);
        assert_eq!(
            ControlProfile::Classic
                .build_controller(ClassicPid::DEFAULT_GAINS, 70.0)
                .name(),
            "classic-pid"
        );
    }
}
