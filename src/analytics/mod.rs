pub mod filter;
pub mod metrics;
pub mod report;

pub use filter::OrderFilter;
pub use metrics::{DashboardSnapshot, GroupTotal, Heatmap};
pub use report::render_text;
