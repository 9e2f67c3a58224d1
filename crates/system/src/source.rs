use async_trait::async_trait;
use cpumon_core::state::{HostIdentity, ProcessorInfo, SecurityStatus};
use cpumon_core::{CounterSnapshot, Result};
use tokio_util::sync::CancellationToken;

/// The host the dashboard reads from.
///
/// `cpu_counters` is called once per sampler tick and must observe `cancel`
/// promptly, returning [`MonitorError::Cancelled`](cpumon_core::MonitorError::Cancelled)
/// once it fires. The remaining reads are one-shot and idempotent.
#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn cpu_counters(&self, cancel: &CancellationToken) -> Result<CounterSnapshot>;

    async fn host_identity(&self) -> Result<HostIdentity>;

    async fn security_status(&self) -> Result<SecurityStatus>;

    async fn processor_inventory(&self) -> Result<Vec<ProcessorInfo>>;
}
