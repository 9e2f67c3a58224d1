use crate::error::ComputationError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The CPU states a host reports cumulative tick counts for.
///
/// Declaration order matches the column order of the aggregate `cpu` line in
/// `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CpuState {
    User,
    Nice,
    System,
    Idle,
    Iowait,
    Irq,
    Softirq,
    Steal,
    Guest,
    GuestNice,
}

impl CpuState {
    pub const ALL: [CpuState; 10] = [
        CpuState::User,
        CpuState::Nice,
        CpuState::System,
        CpuState::Idle,
        CpuState::Iowait,
        CpuState::Irq,
        CpuState::Softirq,
        CpuState::Steal,
        CpuState::Guest,
        CpuState::GuestNice,
    ];

    pub fn name(self) -> &'static str {
        match self {
            CpuState::User      => "user",
            CpuState::Nice      => "nice",
            CpuState::System    => "system",
            CpuState::Idle      => "idle",
            CpuState::Iowait    => "iowait",
            CpuState::Irq       => "irq",
            CpuState::Softirq   => "softirq",
            CpuState::Steal     => "steal",
            CpuState::Guest     => "guest",
            CpuState::GuestNice => "guest_nice",
        }
    }
}

impl fmt::Display for CpuState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CpuState {
    type Err = ComputationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CpuState::ALL
            .into_iter()
            .find(|state| state.name() == s)
            .ok_or_else(|| ComputationError::UnknownCounter(s.to_string()))
    }
}

/// Cumulative per-state tick counts since boot.
///
/// Only the states the host actually reported are present; two snapshots
/// from the same host are expected to carry the same key set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    counters: BTreeMap<CpuState, u64>,
}

impl CounterSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, mostly useful in tests.
    #[must_use]
    pub fn with(mut self, state: CpuState, ticks: u64) -> Self {
        self.counters.insert(state, ticks);
        self
    }

    /// Build a snapshot from `(name, ticks)` pairs as delivered by a remote
    /// collaborator. Unknown or repeated names are rejected.
    pub fn from_named<'a, I>(pairs: I) -> Result<Self, ComputationError>
    where
        I: IntoIterator<Item = (&'a str, u64)>,
    {
        let mut counters = BTreeMap::new();
        for (name, ticks) in pairs {
            let state: CpuState = name.parse()?;
            if counters.insert(state, ticks).is_some() {
                return Err(ComputationError::DuplicateCounter(state));
            }
        }
        Ok(Self { counters })
    }

    pub fn get(&self, state: CpuState) -> Option<u64> {
        self.counters.get(&state).copied()
    }

    /// Reported states in enumeration order.
    pub fn states(&self) -> Vec<CpuState> {
        self.counters.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CpuState, u64)> + '_ {
        self.counters.iter().map(|(state, ticks)| (*state, *ticks))
    }

    pub fn len(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn same_keys(&self, other: &Self) -> bool {
        self.counters.keys().eq(other.counters.keys())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_canonical_names() {
        assert_eq!("guest_nice".parse::<CpuState>(), Ok(CpuState::GuestNice));
        assert_eq!("idle".parse::<CpuState>(), Ok(CpuState::Idle));
    }

    #[test]
    fn rejects_unknown_counter() {
        let err = CounterSnapshot::from_named([("user", 1), ("bogus", 2)]).unwrap_err();
        assert_eq!(err, ComputationError::UnknownCounter("bogus".into()));
    }

    #[test]
    fn rejects_duplicate_counter() {
        let err = CounterSnapshot::from_named([("idle", 1), ("idle", 2)]).unwrap_err();
        assert_eq!(err, ComputationError::DuplicateCounter(CpuState::Idle));
    }

    #[test]
    fn key_set_comparison_ignores_values() {
        let a = CounterSnapshot::new().with(CpuState::User, 1).with(CpuState::Idle, 2);
        let b = CounterSnapshot::new().with(CpuState::User, 9).with(CpuState::Idle, 9);
        let c = CounterSnapshot::new().with(CpuState::User, 1);
        assert!(a.same_keys(&b));
        assert!(!a.same_keys(&c));
    }
}
