use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// Everything the hosting view renders: the rolling usage window plus the
/// static host panels.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardState {
    /// Recent utilization samples, oldest first (0.0 – 100.0).
    pub window: Vec<f64>,
    /// `None` until the identity fetch completes.
    pub identity: Option<HostIdentity>,
    pub security: Option<SecurityStatus>,
    pub processors: Option<Vec<ProcessorInfo>>,
    /// Time the window last changed.
    pub updated_at: Option<DateTime<Local>>,
}

impl DashboardState {
    /// Most recent sample, if any.
    #[must_use]
    pub fn latest(&self) -> Option<f64> {
        self.window.last().copied()
    }
}

/// Host identity panel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostIdentity {
    pub hostname: String,
    pub os_name: String,
    pub os_version: String,
    pub kernel_version: String,
}

/// SELinux mode as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecurityStatus {
    Enforcing,
    Permissive,
    Disabled,
}

/// One logical processor from the host's inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessorInfo {
    pub name: String,
    pub brand: String,
    pub vendor_id: String,
    pub frequency_mhz: u64,
}
