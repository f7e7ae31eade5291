pub mod export;
pub mod plot;
pub mod summary;

pub use export::{summary_to_json, trace_to_csv};
pub use plot::render_dashboard;
pub use summary::{RunSummary, SummaryBuilder};
