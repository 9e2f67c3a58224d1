pub mod counters;
pub mod error;
pub mod event;
pub mod state;

pub use counters::{CounterSnapshot, CpuState};
pub use error::{ComputationError, MonitorError, Result};
pub use event::Diagnostic;
pub use state::DashboardState;
