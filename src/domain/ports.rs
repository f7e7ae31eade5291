use crate::config::settings::SimulationSettings;
use crate::domain::model::{ControlContext, ControlOutput, TickInput};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn settings(&self) -> Result<SimulationSettings>;
    fn output_path(&self) -> &str;
}

/// Turns the speed error of one tick into a control signal.
pub trait Controller: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Clears accumulated state; `initial_speed` seeds the trend estimate.
    fn reset(&mut self, initial_speed_kmh: f64);

    fn compute(&mut self, ctx: &ControlContext) -> ControlOutput;
}

/// Source of operator input, polled once per tick.
#[async_trait]
pub trait InputSource: Send {
    /// `None` ends the run.
    async fn next_input(&mut self, tick: u64, time_s: f64) -> Result<Option<TickInput>>;
}
