//! Periodic CPU sampling for the dashboard.
//!
//! [`Lifecycle`] drives a [`Scheduler`], whose ticks ask a [`FetchGuard`] for
//! a fresh counter snapshot. The guard keeps a single request in flight and
//! folds each response into the rolling window published on a `watch`
//! channel.

pub mod guard;
pub mod lifecycle;
pub mod scheduler;

pub use guard::{FetchGuard, TickOutcome};
pub use lifecycle::Lifecycle;
pub use scheduler::Scheduler;
