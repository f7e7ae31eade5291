use crate::app::inputs::slider::Slider;
use crate::core::profile::ControlProfile;
use crate::domain::model::{ScheduledChange, TickInput};
use crate::domain::ports::InputSource;
use crate::utils::error::Result;
use async_trait::async_trait;

/// Holds the same setpoint and disturbance for the whole run.
#[derive(Debug, Clone)]
pub struct ConstantInput {
    setpoint_kmh: f64,
    disturbance_rpm: f64,
}

impl ConstantInput {
    pub fn new(setpoint_kmh: f64, disturbance_rpm: f64) -> Self {
        Self {
            setpoint_kmh,
            disturbance_rpm,
        }
    }
}

#[async_trait]
impl InputSource for ConstantInput {
    async fn next_input(&mut self, _tick: u64, _time_s: f64) -> Result<Option<TickInput>> {
        Ok(Some(TickInput {
            setpoint_kmh: Some(self.setpoint_kmh),
            disturbance_rpm: self.disturbance_rpm,
        }))
    }
}

/// Replays timed slider moves.
#[derive(Debug, Clone)]
pub struct ScheduledInput {
    setpoint: Slider,
    disturbance: Slider,
    changes: Vec<ScheduledChange>,
    next_change: usize,
}

impl ScheduledInput {
    pub fn new(
        profile: ControlProfile,
        setpoint_kmh: f64,
        disturbance_rpm: f64,
        mut changes: Vec<ScheduledChange>,
    ) -> Self {
        let mut setpoint = profile.setpoint_slider();
        setpoint.set(setpoint_kmh);
        let mut disturbance = profile.disturbance_slider();
        disturbance.set(disturbance_rpm);
        changes.sort_by(|a, b| a.at_s.total_cmp(&b.at_s));

        Self {
            setpoint,
            disturbance,
            changes,
            next_change: 0,
        }
    }

    pub fn pending(&self) -> usize {
        self.changes.len() - self.next_change
    }
}

#[async_trait]
impl InputSource for ScheduledInput {
    async fn next_input(&mut self, _tick: u64, time_s: f64) -> Result<Option<TickInput>> {
        // Half a microsecond of slack absorbs accumulated dt rounding
        while let Some(change) = self.changes.get(self.next_change) {
            if change.at_s > time_s + 5e-7 {
                break;
            }
            if let Some(setpoint) = change.setpoint_kmh {
                let applied = self.setpoint.set(setpoint);
                tracing::info!("🎚 t={:.1}s setpoint -> {:.0} km/h", time_s, applied);
            }
            if let Some(disturbance) = change.disturbance_rpm {
                let applied = self.disturbance.set(disturbance);
                tracing::info!("🎚 t={:.1}s disturbance -> {:.0} RPM", time_s, applied);
            }
            self.next_change += 1;
        }

        Ok(Some(TickInput {
            setpoint_kmh: Some(self.setpoint.value()),
            disturbance_rpm: self.disturbance.value(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_input() {
        let mut input = ConstantInput::new(75.0, 100.0);
        let tick = tokio_test::block_on(input.next_input(3, 0.3)).unwrap().unwrap();
        assert_eq!(tick.setpoint_kmh, Some(75.0));
        assert_eq!(tick.disturbance_rpm, 100.0);
    }

    #[tokio::test]
    async fn test_schedule_applies_changes_in_time_order() {
        let changes = vec![
            ScheduledChange {
                at_s: 2.0,
                setpoint_kmh: None,
                disturbance_rpm: Some(155.0),
            },
            ScheduledChange {
                at_s: 1.0,
                setpoint_kmh: Some(65.4),
                disturbance_rpm: None,
            },
        ];
        let mut input = ScheduledInput::new(ControlProfile::Vss, 80.0, 0.0, changes);
        assert_eq!(input.pending(), 2);

        let tick = input.next_input(0, 0.5).await.unwrap().unwrap();
        assert_eq!(tick.setpoint_kmh, Some(80.0));
        assert_eq!(tick.disturbance_rpm, 0.0);

        let tick = input.next_input(5, 1.0).await.unwrap().unwrap();
        assert_eq!(tick.setpoint_kmh, Some(65.0));
        assert_eq!(input.pending(), 1);

        let tick = input.next_input(15, 2.0).await.unwrap().unwrap();
        assert_eq!(tick.setpoint_kmh, Some(65.0));
        assert_eq!(tick.disturbance_rpm, 160.0);
        assert_eq!(input.pending(), 0);
    }

    #[tokio::test]
    async fn test_schedule_respects_profile_slider_limits() {
        let changes = vec![ScheduledChange {
            at_s: 0.0,
            setpoint_kmh: Some(95.0),
            disturbance_rpm: Some(-400.0),
        }];
        let mut input = ScheduledInput::new(ControlProfile::Vss, 80.0, 0.0, changes);
        let tick = input.next_input(0, 0.0).await.unwrap().unwrap();
        assert_eq!(tick.setpoint_kmh, Some(80.0));
        assert_eq!(tick.disturbance_rpm, -100.0);
    }
}
