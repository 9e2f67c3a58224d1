//! Host-side pieces of the CPU dashboard: turning counter snapshots into
//! utilization, the rolling display window, and the metrics collaborator.

pub mod cpu;
pub mod procfs;
pub mod source;

pub use cpu::{utilization, UsageWindow};
pub use procfs::ProcfsSource;
pub use source::MetricsSource;
