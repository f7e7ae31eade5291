use crate::core::profile::ControlProfile;
use crate::domain::model::Sample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub profile: ControlProfile,
    pub controller: String,
    pub ticks: u64,
    pub dt: f64,
    pub simulated_secs: f64,
    pub final_setpoint_kmh: f64,
    pub final_speed_kmh: f64,
    pub min_speed_kmh: f64,
    pub max_speed_kmh: f64,
    /// Fraction of ticks that ended inside the band.
    pub in_band_ratio: f64,
    pub max_abs_error_kmh: f64,
    /// Integral of absolute error, km/h·s.
    pub iae_kmh_s: f64,
    /// Trace timestamp of the sample that opened the final in-band stretch;
    /// `None` if the run ended outside the band.
    pub settling_time_s: Option<f64>,
    pub corrective_ticks: u64,
}

/// Accumulates run statistics tick by tick, so the exported trace can be
/// truncated without skewing the summary.
#[derive(Debug, Clone)]
pub struct SummaryBuilder {
    started_at: DateTime<Utc>,
    profile: ControlProfile,
    controller: String,
    dt: f64,
    ticks: u64,
    in_band_ticks: u64,
    corrective_ticks: u64,
    max_abs_error: f64,
    iae: f64,
    min_speed: f64,
    max_speed: f64,
    settled_since: Option<f64>,
    last: Option<Sample>,
}

impl SummaryBuilder {
    pub fn new(profile: ControlProfile, controller: &str, dt: f64) -> Self {
        Self {
            started_at: Utc::now(),
            profile,
            controller: controller.to_string(),
            dt,
            ticks: 0,
            in_band_ticks: 0,
            corrective_ticks: 0,
            max_abs_error: 0.0,
            iae: 0.0,
            min_speed: f64::INFINITY,
            max_speed: f64::NEG_INFINITY,
            settled_since: None,
            last: None,
        }
    }

    pub fn observe(&mut self, sample: &Sample) {
        let abs_error = sample.error_kmh.abs();
        self.max_abs_error = self.max_abs_error.max(abs_error);
        self.iae += abs_error * self.dt;
        self.min_speed = self.min_speed.min(sample.speed_kmh);
        self.max_speed = self.max_speed.max(sample.speed_kmh);

        if sample.corrective.abs() > 0.0 {
            self.corrective_ticks += 1;
        }

        if sample.in_band {
            self.in_band_ticks += 1;
            if self.settled_since.is_none() {
                self.settled_since = Some(sample.time_s);
            }
        } else {
            self.settled_since = None;
        }

        self.ticks += 1;
        self.last = Some(*sample);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn finish(&self) -> RunSummary {
        let (final_setpoint_kmh, final_speed_kmh) = self
            .last
            .map(|s| (s.setpoint_kmh, s.speed_kmh))
            .unwrap_or((0.0, 0.0));

        RunSummary {
            started_at: self.started_at,
            profile: self.profile,
            controller: self.controller.clone(),
            ticks: self.ticks,
            dt: self.dt,
            simulated_secs: self.ticks as f64 * self.dt,
            final_setpoint_kmh,
            final_speed_kmh,
            min_speed_kmh: if self.ticks > 0 { self.min_speed } else { 0.0 },
            max_speed_kmh: if self.ticks > 0 { self.max_speed } else { 0.0 },
            in_band_ratio: if self.ticks > 0 {
                self.in_band_ticks as f64 / self.ticks as f64
            } else {
                0.0
            },
            max_abs_error_kmh: self.max_abs_error,
            iae_kmh_s: self.iae,
            settling_time_s: self.settled_since,
            corrective_ticks: self.corrective_ticks,
        }
    }
}
