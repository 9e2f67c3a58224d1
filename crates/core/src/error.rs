use crate::counters::CpuState;
use thiserror::Error;

/// Top-level error type used across the entire application.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("config error: {0}")]
    Config(String),

    /// The metrics source could not deliver a snapshot.
    #[error("transport error: {0}")]
    Transport(String),

    /// The request was aborted through its cancellation token.
    #[error("request cancelled")]
    Cancelled,

    #[error("computation error: {0}")]
    Computation(#[from] ComputationError),

    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

/// Degenerate or mismatched counter data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ComputationError {
    #[error("counter key sets differ (current: {current:?}, previous: {previous:?})")]
    KeySetMismatch {
        current: Vec<CpuState>,
        previous: Vec<CpuState>,
    },

    #[error("snapshot has no idle counter")]
    MissingIdle,

    #[error("counter '{state}' went backwards ({previous} -> {current})")]
    CounterRegressed {
        state: CpuState,
        previous: u64,
        current: u64,
    },

    #[error("unknown counter '{0}'")]
    UnknownCounter(String),

    #[error("counter '{0}' reported twice")]
    DuplicateCounter(CpuState),
}

pub type Result<T, E = MonitorError> = std::result::Result<T, E>;
