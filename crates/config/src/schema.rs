use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure parsed from `cpumon.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Tick interval and window size.
    pub sampler: SamplerConfig,
    /// Where the local metrics source reads from.
    pub source: SourceConfig,
}

/// Sampler timing and display buffer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Milliseconds between ticks.
    pub interval_ms: u64,
    /// Number of samples kept for charting.
    pub window_capacity: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            interval_ms:     1_000,
            window_capacity: 11,
        }
    }
}

/// Paths used by the procfs-backed metrics source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub proc_stat: PathBuf,
    /// SELinux mode file; absence means SELinux is disabled.
    pub selinux_enforce: PathBuf,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            proc_stat:       PathBuf::from("/proc/stat"),
            selinux_enforce: PathBuf::from("/sys/fs/selinux/enforce"),
        }
    }
}
