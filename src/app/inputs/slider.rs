use serde::{Deserialize, Serialize};

/// Bounded, quantised operator control.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Slider {
    min: f64,
    max: f64,
    step: f64,
    value: f64,
}

impl Slider {
    pub fn new(min: f64, max: f64, step: f64, initial: f64) -> Self {
        let mut slider = Self {
            min: min.min(max),
            max: max.max(min),
            step: step.abs(),
            value: min,
        };
        slider.set(initial);
        slider
    }

    /// Clamps into range and snaps to the nearest `min + k * step`.
    pub fn set(&mut self, value: f64) -> f64 {
        if !value.is_finite() {
            return self.value;
        }
        let clamped = value.clamp(self.min, self.max);
        let snapped = if self.step > 0.0 {
            self.min + ((clamped - self.min) / self.step).round() * self.step
        } else {
            clamped
        };
        self.value = snapped.clamp(self.min, self.max);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}
