use serde::{Deserialize, Serialize};

/// Vehicle Speed Sensor: a linear 0-5 V signal over the 50-100 km/h span.
///
/// The same scale carries the controller output, centred on `neutral_volts`
/// ("do not modify") with `control_span` internal units mapping to the full
/// half-range of the signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VssSensor {
    pub speed_min_kmh: f64,
    pub speed_max_kmh: f64,
    pub volts_min: f64,
    pub volts_max: f64,
    pub neutral_volts: f64,
    pub control_span: f64,
}

impl Default for VssSensor {
    fn default() -> Self {
        Self {
            speed_min_kmh: 50.0,
            speed_max_kmh: 100.0,
            volts_min: 0.0,
            volts_max: 5.0,
            neutral_volts: 2.5,
            control_span: 25.0,
        }
    }
}

impl VssSensor {
    pub fn speed_to_volts(&self, speed_kmh: f64) -> f64 {
        let speed_range = self.speed_max_kmh - self.speed_min_kmh;
        if speed_range == 0.0 {
            return 0.0;
        }
        let volts = (speed_kmh - self.speed_min_kmh) / speed_range
            * (self.volts_max - self.volts_min)
            + self.volts_min;
        volts.clamp(self.volts_min, self.volts_max)
    }

    pub fn volts_to_speed(&self, volts: f64) -> f64 {
        let volts_range = self.volts_max - self.volts_min;
        if volts_range == 0.0 {
            return self.speed_min_kmh;
        }
        (volts - self.volts_min) / volts_range * (self.speed_max_kmh - self.speed_min_kmh)
            + self.speed_min_kmh
    }

    /// Converts a voltage difference into the matching speed difference.
    pub fn error_volts_to_kmh(&self, error_volts: f64) -> f64 {
        let volts_range = self.volts_max - self.volts_min;
        if volts_range == 0.0 {
            return 0.0;
        }
        error_volts * (self.speed_max_kmh - self.speed_min_kmh) / volts_range
    }

    pub fn control_to_volts(&self, control_signal: f64) -> f64 {
        let scaled = control_signal.clamp(-self.control_span, self.control_span)
            * (self.neutral_volts / self.control_span);
        (scaled + self.neutral_volts).clamp(self.volts_min, self.volts_max)
    }
}
