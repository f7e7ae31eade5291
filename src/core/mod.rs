pub mod controller;
pub mod engine;
pub mod history;
pub mod plant;
pub mod profile;
pub mod system;
pub mod vss;

pub use crate::domain::model::{Sample, TickInput};
pub use crate::domain::ports::{ConfigProvider, Controller, InputSource, Storage};
pub use crate::utils::error::Result;
pub use engine::{RunReport, SimulationEngine};
pub use system::SpeedControlSystem;
