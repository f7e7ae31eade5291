use crate::domain::model::Sample;
use std::collections::VecDeque;

pub const DEFAULT_CAPACITY: usize = 150;
pub const SEED_SAMPLES: usize = 5;

/// Fixed-size rolling window of samples; the oldest sample is evicted first.
#[derive(Debug, Clone)]
pub struct History {
    capacity: usize,
    samples: VecDeque<Sample>,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
        }
    }

    /// Pre-fills `count` copies of `seed` spaced `dt` apart from t = 0, so a
    /// chart has something to draw before the first tick.
    pub fn seeded(capacity: usize, count: usize, dt: f64, seed: Sample) -> Self {
        let mut history = Self::new(capacity);
        for i in 0..count {
            history.push(Sample {
                time_s: i as f64 * dt,
                ..seed
            });
        }
        history
    }

    pub fn push(&mut self, sample: Sample) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    /// Time stamp for the next sample.
    pub fn next_time(&self, dt: f64) -> f64 {
        self.samples.back().map(|s| s.time_s + dt).unwrap_or(0.0)
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Extracts one field across the window as `(time, value)` pairs.
    pub fn series<F>(&self, field: F) -> Vec<(f64, f64)>
    where
        F: Fn(&Sample) -> f64,
    {
        self.samples.iter().map(|s| (s.time_s, field(s))).collect()
    }
}
