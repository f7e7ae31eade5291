pub mod live;
pub mod scheduled;
pub mod slider;

pub use live::{ControlPanel, LiveInput, PanelCommand};
pub use scheduled::{ConstantInput, ScheduledInput};
pub use slider::Slider;
