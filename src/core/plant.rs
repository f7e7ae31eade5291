use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlantParams {
    /// Engine speed that yields exactly the setpoint.
    pub rpm_nominal: f64,
    pub rpm_min: f64,
    pub rpm_max: f64,
    pub speed_min_kmh: f64,
    pub speed_max_kmh: f64,
    /// RPM per second per unit of control signal.
    pub base_gain: f64,
    /// Multiplier on `base_gain` while the speed is outside the band.
    pub out_of_band_boost: f64,
    pub disturbance_min_rpm: f64,
    pub disturbance_max_rpm: f64,
    pub disturbance_attenuation: f64,
    pub initial_speed_kmh: f64,
    pub initial_rpm: f64,
}

/// Result of one plant integration step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlantStep {
    pub rpm_ctrl: f64,
    pub rpm_real: f64,
    pub speed_kmh: f64,
    pub attenuated_disturbance_rpm: f64,
}

/// Motor whose commanded RPM integrates the control signal. The measured
/// RPM adds the (attenuated) disturbance and the vehicle speed scales with
/// the RPM ratio.
#[derive(Debug, Clone)]
pub struct MotorPlant {
    params: PlantParams,
    rpm_ctrl: f64,
    rpm_real: f64,
    speed_kmh: f64,
}

impl MotorPlant {
    pub fn new(params: PlantParams) -> Self {
        Self {
            rpm_ctrl: params.initial_rpm,
            rpm_real: params.initial_rpm,
            speed_kmh: params.initial_speed_kmh,
            params,
        }
    }

    pub fn params(&self) -> &PlantParams {
        &self.params
    }

    pub fn rpm_ctrl(&self) -> f64 {
        self.rpm_ctrl
    }

    pub fn rpm_real(&self) -> f64 {
        self.rpm_real
    }

    pub fn speed_kmh(&self) -> f64 {
        self.speed_kmh
    }

    pub fn attenuate(&self, disturbance_rpm: f64) -> f64 {
        disturbance_rpm.clamp(self.params.disturbance_min_rpm, self.params.disturbance_max_rpm)
            * self.params.disturbance_attenuation
    }

    pub fn step(
        &mut self,
        control_signal: f64,
        setpoint_kmh: f64,
        disturbance_rpm: f64,
        out_of_band: bool,
        dt: f64,
    ) -> PlantStep {
        let p = &self.params;
        let gain = if out_of_band {
            p.base_gain * p.out_of_band_boost
        } else {
            p.base_gain
        };

        self.rpm_ctrl = (self.rpm_ctrl + control_signal * gain * dt).clamp(p.rpm_min, p.rpm_max);

        let attenuated = self.attenuate(disturbance_rpm);
        let p = &self.params;
        self.rpm_real = (self.rpm_ctrl + attenuated).clamp(p.rpm_min, p.rpm_max);

        self.speed_kmh = (self.rpm_real / p.rpm_nominal * setpoint_kmh)
            .clamp(p.speed_min_kmh, p.speed_max_kmh);

        PlantStep {
            rpm_ctrl: self.rpm_ctrl,
            rpm_real: self.rpm_real,
            speed_kmh: self.speed_kmh,
            attenuated_disturbance_rpm: attenuated,
        }
    }
}
