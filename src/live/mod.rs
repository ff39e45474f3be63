//! Live device list: catalog and today's records merged as they change.

mod board;
mod dashboard;

pub use board::DeviceBoard;
pub use dashboard::{DashboardState, LiveDashboard};
