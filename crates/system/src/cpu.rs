use cpumon_core::{ComputationError, CounterSnapshot, CpuState};
use std::collections::VecDeque;

/// Percentage of non-idle time between two snapshots, rounded to two decimals.
///
/// Both snapshots must report the same counters. A zero total delta (nothing
/// advanced) yields `0.0` rather than dividing by zero.
pub fn utilization(
    current: &CounterSnapshot,
    previous: &CounterSnapshot,
) -> Result<f64, ComputationError> {
    if !current.same_keys(previous) {
        return Err(ComputationError::KeySetMismatch {
            current:  current.states(),
            previous: previous.states(),
        });
    }

    let mut total: u64 = 0;
    let mut idle: Option<u64> = None;
    for ((state, now), (_, before)) in current.iter().zip(previous.iter()) {
        let delta = now
            .checked_sub(before)
            .ok_or(ComputationError::CounterRegressed {
                state,
                previous: before,
                current: now,
            })?;
        total = total.saturating_add(delta);
        if state == CpuState::Idle {
            idle = Some(delta);
        }
    }
    let idle = idle.ok_or(ComputationError::MissingIdle)?;

    if total == 0 {
        tracing::debug!("zero total delta between snapshots; reporting 0%");
        return Ok(0.0);
    }

    let busy = (total - idle) as f64;
    Ok((busy * 10_000.0 / total as f64).round() / 100.0)
}

/// Rolling window of CPU usage samples, oldest first, for chart rendering.
#[derive(Debug, Clone)]
pub struct UsageWindow {
    samples:  VecDeque<f64>,
    capacity: usize,
}

impl UsageWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples:  VecDeque::with_capacity(capacity.saturating_add(1)),
            capacity,
        }
    }

    /// Append at the tail, evicting the oldest sample once over capacity.
    pub fn append(&mut self, sample: f64) {
        self.samples.push_back(sample);
        while self.samples.len() > self.capacity {
            self.samples.pop_front();
        }
    }

    /// Ordered copy of the current samples.
    pub fn snapshot(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
