use crate::domain::model::{ControlContext, ControlOutput};
use crate::domain::ports::Controller;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

// Proportional scaling outside and near the edges of the band
const ABOVE_BAND_KP_BOOST: f64 = 1.5;
const BELOW_BAND_KP_BOOST: f64 = 1.3;
const NEAR_EDGE_MARGIN_KMH: f64 = 0.3;
const NEAR_EDGE_KP_SCALE: f64 = 0.7;

// Integral only accumulates close to the setpoint and bleeds off elsewhere
const INTEGRAL_WINDOW_KMH: f64 = 1.0;
const INTEGRAL_RATE: f64 = 0.02;
const INTEGRAL_LIMIT: f64 = 2.0;
const INTEGRAL_DECAY: f64 = 0.9;

// Overshoot prevention on the one-tick speed projection
const PROJECTION_TRIGGER_KMH: f64 = 0.3;
const PROJECTION_TARGET_KMH: f64 = 0.2;
const UPPER_CORRECTIVE_GAIN: f64 = 10.0;
const LOWER_CORRECTIVE_GAIN: f64 = 6.0;

const GUARD_MARGIN_KMH: f64 = 0.2;
const ABOVE_GUARD_LIMITS: (f64, f64) = (-30.0, 5.0);
const BELOW_GUARD_LIMITS: (f64, f64) = (-5.0, 20.0);
const NORMAL_LIMITS: (f64, f64) = (-25.0, 25.0);

/// PID with band-aware gain scheduling and overshoot prevention.
///
/// Outside the target band the proportional term works on the raw speed
/// difference with a stronger gain; inside it the gain is softened near the
/// edges. A projection of the next speed adds a corrective kick before the
/// band is crossed, and the output limits tighten on the side the vehicle is
/// already past.
#[derive(Debug, Clone)]
pub struct AdaptiveController {
    gains: PidGains,
    integral: f64,
    previous_error: f64,
    previous_speed: f64,
    trend: f64,
}

impl AdaptiveController {
    pub const DEFAULT_GAINS: PidGains = PidGains {
        kp: 4.0,
        ki: 0.2,
        kd: 0.8,
    };

    pub fn new(gains: PidGains, initial_speed_kmh: f64) -> Self {
        Self {
            gains,
            integral: 0.0,
            previous_error: 0.0,
            previous_speed: initial_speed_kmh,
            trend: 0.0,
        }
    }

    pub fn trend(&self) -> f64 {
        self.trend
    }

    pub fn integral_state(&self) -> f64 {
        self.integral
    }
}

impl Controller for AdaptiveController {
    fn name(&self) -> &'static str {
        "adaptive-pid"
    }

    fn reset(&mut self, initial_speed_kmh: f64) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.previous_speed = initial_speed_kmh;
        self.trend = 0.0;
    }

    fn compute(&mut self, ctx: &ControlContext) -> ControlOutput {
        let error = ctx.error_kmh;
        let speed = ctx.speed_kmh;
        let (band_min, band_max) = ctx.band;
        let in_band = ctx.in_band();

        if ctx.dt > 0.0 {
            self.trend = (speed - self.previous_speed) / ctx.dt;
        }
        self.previous_speed = speed;

        let (effective_error, kp) = if !in_band {
            let boost = if speed > band_max {
                ABOVE_BAND_KP_BOOST
            } else {
                BELOW_BAND_KP_BOOST
            };
            (ctx.setpoint_kmh - speed, self.gains.kp * boost)
        } else if (speed - ctx.setpoint_kmh).abs() > NEAR_EDGE_MARGIN_KMH {
            (error, self.gains.kp * NEAR_EDGE_KP_SCALE)
        } else {
            (error, self.gains.kp)
        };
        let proportional = kp * effective_error;

        if in_band && error.abs() < INTEGRAL_WINDOW_KMH {
            self.integral = (self.integral + error * ctx.dt * INTEGRAL_RATE)
                .clamp(-INTEGRAL_LIMIT, INTEGRAL_LIMIT);
        } else {
            self.integral *= INTEGRAL_DECAY;
        }
        let integral = self.gains.ki * self.integral;

        let derivative = if ctx.dt > 0.0 {
            self.gains.kd * (error - self.previous_error) / ctx.dt
        } else {
            0.0
        };

        let projected = speed + self.trend * ctx.dt;
        let corrective = if projected > band_max + PROJECTION_TRIGGER_KMH {
            -(projected - (band_max + PROJECTION_TARGET_KMH)) * UPPER_CORRECTIVE_GAIN
        } else if projected < band_min - PROJECTION_TRIGGER_KMH {
            ((band_min - PROJECTION_TARGET_KMH) - projected) * LOWER_CORRECTIVE_GAIN
        } else {
            0.0
        };
        if corrective != 0.0 {
            tracing::debug!(projected, corrective, "overshoot prevention");
        }

        let (low, high) = if speed > band_max + GUARD_MARGIN_KMH {
            ABOVE_GUARD_LIMITS
        } else if speed < band_min - GUARD_MARGIN_KMH {
            BELOW_GUARD_LIMITS
        } else {
            NORMAL_LIMITS
        };
        let signal = (proportional + integral + derivative + corrective).clamp(low, high);

        self.previous_error = error;

        ControlOutput {
            signal,
            proportional,
            integral,
            derivative,
            corrective,
        }
    }
}

/// Textbook PID with a clamped integrator and clamped output.
#[derive(Debug, Clone)]
pub struct ClassicPid {
    gains: PidGains,
    integral_limit: f64,
    output_limit: f64,
    integral: f64,
    previous_error: f64,
}

impl ClassicPid {
    pub const DEFAULT_GAINS: PidGains = PidGains {
        kp: 2.0,
        ki: 0.3,
        kd: 0.4,
    };

    pub fn new(gains: PidGains) -> Self {
        Self {
            gains,
            integral_limit: 15.0,
            output_limit: 20.0,
            integral: 0.0,
            previous_error: 0.0,
        }
    }
}

impl Controller for ClassicPid {
    fn name(&self) -> &'static str {
        "classic-pid"
    }

    fn reset(&mut self, _initial_speed_kmh: f64) {
        self.integral = 0.0;
        self.previous_error = 0.0;
    }

    fn compute(&mut self, ctx: &ControlContext) -> ControlOutput {
        let error = ctx.error_kmh;

        self.integral = (self.integral + error * ctx.dt)
            .clamp(-self.integral_limit, self.integral_limit);

        let rate = if ctx.dt > 0.0 {
            (error - self.previous_error) / ctx.dt
        } else {
            0.0
        };

        let proportional = self.gains.kp * error;
        let integral = self.gains.ki * self.integral;
        let derivative = self.gains.kd * rate;
        let signal = (proportional + integral + derivative)
            .clamp(-self.output_limit, self.output_limit);

        self.previous_error = error;

        ControlOutput {
            signal,
            proportional,
            integral,
            derivative,
            corrective: 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ctx(setpoint: f64, speed: f64) -> ControlContext {
        ControlContext {
            setpoint_kmh: setpoint,
            speed_kmh: speed,
            error_kmh: setpoint - speed,
            band: (setpoint - 2.0, setpoint + 1.0),
            dt: 0.1,
        }
    }

    #[test]
    fn test_adaptive_first_tick_below_band() {
        let mut controller = AdaptiveController::new(AdaptiveController::DEFAULT_GAINS, 70.0);
        let out = controller.compute(&ctx(80.0, 70.0));

        // Kp boosted by 1.3 below the band: 4.0 * 1.3 * 10
        assert_relative_eq!(out.proportional, 52.0, epsilon = 1e-9);
        assert_relative_eq!(out.integral, 0.0);
        // First derivative sees the jump from a zero previous error
        assert_relative_eq!(out.derivative, 80.0, epsilon = 1e-9);
        // Projection at 70 km/h is far below 77.8 km/h: (77.8 - 70) * 6
        assert_relative_eq!(out.corrective, 46.8, epsilon = 1e-9);
        // Below the guard the output is limited to [-5, 20]
        assert_relative_eq!(out.signal, 20.0);
    }

    #[test]
    fn test_adaptive_above_band_is_limited_to_small_positive_action() {
        let mut controller = AdaptiveController::new(AdaptiveController::DEFAULT_GAINS, 85.0);
        let out = controller.compute(&ctx(80.0, 85.0));
        assert_relative_eq!(out.proportional, 4.0 * 1.5 * -5.0, epsilon = 1e-9);
        assert!(out.signal <= 5.0);
        assert!(out.signal >= -30.0);
        assert!(out.corrective < 0.0);
    }

    #[test]
    fn test_adaptive_near_edge_softens_gain() {
        let mut controller = AdaptiveController::new(AdaptiveController::DEFAULT_GAINS, 79.0);
        let out = controller.compute(&ctx(80.0, 79.0));
        assert_relative_eq!(out.proportional, 4.0 * 0.7 * 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_adaptive_integral_accumulates_only_close_to_setpoint() {
        let mut controller = AdaptiveController::new(AdaptiveController::DEFAULT_GAINS, 79.8);
        controller.compute(&ctx(80.0, 79.8));
        assert_relative_eq!(controller.integral_state(), 0.2 * 0.1 * 0.02, epsilon = 1e-12);

        let before = controller.integral_state();
        controller.compute(&ctx(80.0, 75.0));
        assert_relative_eq!(controller.integral_state(), before * 0.9, epsilon = 1e-12);
    }

    #[test]
    fn test_adaptive_trend_and_reset() {
        let mut controller = AdaptiveController::new(AdaptiveController::DEFAULT_GAINS, 79.0);
        controller.compute(&ctx(80.0, 79.5));
        assert_relative_eq!(controller.trend(), 5.0, epsilon = 1e-9);

        controller.reset(80.0);
        assert_eq!(controller.trend(), 0.0);
        assert_eq!(controller.integral_state(), 0.0);
    }

    #[test]
    fn test_classic_pid_terms() {
        let mut pid = ClassicPid::new(ClassicPid::DEFAULT_GAINS);
        let out = pid.compute(&ctx(80.0, 70.0));
        assert_relative_eq!(out.proportional, 20.0, epsilon = 1e-9);
        assert_relative_eq!(out.integral, 0.3 * 1.0, epsilon = 1e-9);
        assert_relative_eq!(out.derivative, 0.4 * 100.0, epsilon = 1e-9);
        assert_relative_eq!(out.signal, 20.0);
        assert_eq!(out.corrective, 0.0);
    }

    #[test]
    fn test_classic_pid_integral_is_clamped() {
        let mut pid = ClassicPid::new(ClassicPid::DEFAULT_GAINS);
        for _ in 0..1000 {
            pid.compute(&ctx(80.0, 50.0));
        }
        let out = pid.compute(&ctx(80.0, 50.0));
        assert_relative_eq!(out.integral, 0.3 * 15.0, epsilon = 1e-9);
    }
}
