use crate::config::settings::SimulationSettings;
use crate::core::history::{History, SEED_SAMPLES};
use crate::core::plant::MotorPlant;
use crate::core::profile::{ControlProfile, ErrorInput};
use crate::core::vss::VssSensor;
use crate::domain::model::{ControlContext, Sample, TargetBand, TickInput};
use crate::domain::ports::Controller;
use serde::Serialize;

/// Point-in-time view of the loop, used for status lines and reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Snapshot {
    pub time_s: f64,
    pub setpoint_kmh: f64,
    pub speed_kmh: f64,
    pub band_min_kmh: f64,
    pub band_max_kmh: f64,
    pub in_band: bool,
    pub setpoint_volts: f64,
    pub speed_volts: f64,
    pub error_volts: f64,
    pub control_volts: f64,
}

/// The closed speed loop: sensor, controller and plant advanced one scan
/// period at a time.
#[derive(Debug)]
pub struct SpeedControlSystem {
    profile: ControlProfile,
    dt: f64,
    vss: VssSensor,
    band: TargetBand,
    controller: Box<dyn Controller>,
    plant: MotorPlant,
    history: History,
    setpoint_kmh: f64,
    elapsed_s: f64,
    last_error_volts: f64,
    last_control_volts: f64,
}

impl SpeedControlSystem {
    pub fn new(settings: &SimulationSettings) -> Self {
        let plant = MotorPlant::new(settings.profile.plant_params());
        Self::with_parts(
            settings,
            settings
                .profile
                .build_controller(settings.gains, plant.speed_kmh()),
            plant,
        )
    }

    /// Builds the loop around a caller-supplied controller.
    pub fn with_parts(
        settings: &SimulationSettings,
        mut controller: Box<dyn Controller>,
        plant: MotorPlant,
    ) -> Self {
        let vss = VssSensor::default();
        let band = TargetBand::default();
        let speed = plant.speed_kmh();
        controller.reset(speed);

        let seed = Sample {
            time_s: 0.0,
            setpoint_kmh: settings.setpoint_kmh,
            speed_kmh: speed,
            error_kmh: 0.0,
            error_volts: 0.0,
            control_signal: 0.0,
            control_volts: vss.neutral_volts,
            disturbance_rpm: 0.0,
            attenuated_disturbance_rpm: 0.0,
            feedback_kmh: speed,
            proportional: 0.0,
            integral: 0.0,
            derivative: 0.0,
            corrective: 0.0,
            rpm_ctrl: plant.rpm_ctrl(),
            rpm_real: plant.rpm_real(),
            in_band: band.contains(settings.setpoint_kmh, speed),
        };
        let history = History::seeded(settings.history_capacity, SEED_SAMPLES, settings.dt, seed);

        Self {
            profile: settings.profile,
            dt: settings.dt,
            vss,
            band,
            controller,
            plant,
            history,
            setpoint_kmh: settings.setpoint_kmh,
            elapsed_s: 0.0,
            last_error_volts: 0.0,
            last_control_volts: vss.neutral_volts,
        }
    }

    pub fn update(&mut self, input: TickInput) -> Sample {
        if let Some(setpoint) = input.setpoint_kmh {
            self.setpoint_kmh = setpoint;
        }
        self.elapsed_s += self.dt;

        let setpoint = self.setpoint_kmh;
        let speed = self.plant.speed_kmh();
        let band = self.band.bounds(setpoint);
        let in_band_before = self.band.contains(setpoint, speed);

        let error_volts = self.vss.speed_to_volts(setpoint) - self.vss.speed_to_volts(speed);
        let error_kmh = setpoint - speed;
        let controller_error = match self.profile.error_input() {
            ErrorInput::Volts => self.vss.error_volts_to_kmh(error_volts),
            ErrorInput::Kmh => error_kmh,
        };

        let output = self.controller.compute(&ControlContext {
            setpoint_kmh: setpoint,
            speed_kmh: speed,
            error_kmh: controller_error,
            band,
            dt: self.dt,
        });
        let control_volts = self.vss.control_to_volts(output.signal);

        let step = self.plant.step(
            output.signal,
            setpoint,
            input.disturbance_rpm,
            !in_band_before,
            self.dt,
        );

        let sample = Sample {
            time_s: self.history.next_time(self.dt),
            setpoint_kmh: setpoint,
            speed_kmh: step.speed_kmh,
            error_kmh,
            error_volts,
            control_signal: output.signal,
            control_volts,
            disturbance_rpm: input.disturbance_rpm,
            attenuated_disturbance_rpm: step.attenuated_disturbance_rpm,
            feedback_kmh: step.speed_kmh,
            proportional: output.proportional,
            integral: output.integral,
            derivative: output.derivative,
            corrective: output.corrective,
            rpm_ctrl: step.rpm_ctrl,
            rpm_real: step.rpm_real,
            in_band: self.band.contains(setpoint, step.speed_kmh),
        };

        self.last_error_volts = error_volts;
        self.last_control_volts = control_volts;
        self.history.push(sample);
        sample
    }

    pub fn snapshot(&self) -> Snapshot {
        let speed = self.plant.speed_kmh();
        let (band_min_kmh, band_max_kmh) = self.band.bounds(self.setpoint_kmh);
        Snapshot {
            time_s: self.history.latest().map(|s| s.time_s).unwrap_or(0.0),
            setpoint_kmh: self.setpoint_kmh,
            speed_kmh: speed,
            band_min_kmh,
            band_max_kmh,
            in_band: self.band.contains(self.setpoint_kmh, speed),
            setpoint_volts: self.vss.speed_to_volts(self.setpoint_kmh),
            speed_volts: self.vss.speed_to_volts(speed),
            error_volts: self.last_error_volts,
            control_volts: self.last_control_volts,
        }
    }

    pub fn band(&self) -> (f64, f64) {
        self.band.bounds(self.setpoint_kmh)
    }

    pub fn in_band(&self) -> bool {
        self.band.contains(self.setpoint_kmh, self.plant.speed_kmh())
    }

    pub fn speed(&self) -> f64 {
        self.plant.speed_kmh()
    }

    pub fn setpoint(&self) -> f64 {
        self.setpoint_kmh
    }

    pub fn elapsed(&self) -> f64 {
        self.elapsed_s
    }

    pub fn dt(&self) -> f64 {
        self.dt
    }

    pub fn profile(&self) -> ControlProfile {
        self.profile
    }

    pub fn controller_name(&self) -> &'static str {
        self.controller.name()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn vss(&self) -> &VssSensor {
        &self.vss
    }

    pub fn plant(&self) -> &MotorPlant {
        &self.plant
    }
}

/// Console line for one tick.
pub fn format_tick_line(sample: &Sample, band: (f64, f64)) -> String {
    let status = if sample.in_band { "✓" } else { "✗" };
    let correction = if sample.corrective.abs() > 2.0 { "🛡" } else { " " };
    format!(
        "T: {:5.1}s | θi: {:4.0}km/h | θ₀: {:5.1}km/h | eV: {:5.3}V | θ₀c: {:5.3}V | p: {:4.0}RPM | band: [{:.0}-{:.0}] {} {}",
        sample.time_s,
        sample.setpoint_kmh,
        sample.speed_kmh,
        sample.error_volts,
        sample.control_volts,
        sample.disturbance_rpm,
        band.0,
        band.1,
        status,
        correction
    )
}
