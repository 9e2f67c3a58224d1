use crate::source::MetricsSource;
use async_trait::async_trait;
use cpumon_config::SourceConfig;
use cpumon_core::state::{HostIdentity, ProcessorInfo, SecurityStatus};
use cpumon_core::{CounterSnapshot, CpuState, MonitorError, Result};
use std::io::ErrorKind;
use std::path::PathBuf;
use sysinfo::{CpuRefreshKind, RefreshKind, System};
use tokio_util::sync::CancellationToken;

/// Reads the local host: counters from `/proc/stat`, panels from `sysinfo`
/// and the SELinux mode file.
#[derive(Debug, Clone)]
pub struct ProcfsSource {
    proc_stat:       PathBuf,
    selinux_enforce: PathBuf,
}

impl ProcfsSource {
    pub fn new(config: &SourceConfig) -> Self {
        Self {
            proc_stat:       config.proc_stat.clone(),
            selinux_enforce: config.selinux_enforce.clone(),
        }
    }
}

impl Default for ProcfsSource {
    fn default() -> Self {
        Self::new(&SourceConfig::default())
    }
}

#[async_trait]
impl MetricsSource for ProcfsSource {
    async fn cpu_counters(&self, cancel: &CancellationToken) -> Result<CounterSnapshot> {
        let raw = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(MonitorError::Cancelled),
            raw = tokio::fs::read_to_string(&self.proc_stat) => raw.map_err(|e| {
                MonitorError::Transport(format!("read '{}': {e}", self.proc_stat.display()))
            })?,
        };
        parse_proc_stat(&raw)
    }

    async fn host_identity(&self) -> Result<HostIdentity> {
        tokio::task::spawn_blocking(|| HostIdentity {
            hostname:       System::host_name().unwrap_or_default(),
            os_name:        System::name().unwrap_or_default(),
            os_version:     System::os_version().unwrap_or_default(),
            kernel_version: System::kernel_version().unwrap_or_default(),
        })
        .await
        .map_err(|e| MonitorError::Transport(format!("host identity task: {e}")))
    }

    async fn security_status(&self) -> Result<SecurityStatus> {
        match tokio::fs::read_to_string(&self.selinux_enforce).await {
            Ok(raw) => parse_enforce(&raw),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SecurityStatus::Disabled),
            Err(e) => Err(e.into()),
        }
    }

    async fn processor_inventory(&self) -> Result<Vec<ProcessorInfo>> {
        tokio::task::spawn_blocking(|| {
            let sys = System::new_with_specifics(
                RefreshKind::nothing().with_cpu(CpuRefreshKind::everything()),
            );
            sys.cpus()
                .iter()
                .map(|cpu| ProcessorInfo {
                    name:          cpu.name().to_string(),
                    brand:         cpu.brand().to_string(),
                    vendor_id:     cpu.vendor_id().to_string(),
                    frequency_mhz: cpu.frequency(),
                })
                .collect()
        })
        .await
        .map_err(|e| MonitorError::Transport(format!("processor inventory task: {e}")))
    }
}

/// Parse the aggregate `cpu` line of `/proc/stat`.
///
/// Columns map onto [`CpuState::ALL`] in order. Older kernels report fewer
/// columns; at least user/nice/system/idle must be present.
pub fn parse_proc_stat(raw: &str) -> Result<CounterSnapshot> {
    let line = raw
        .lines()
        .find(|line| line.starts_with("cpu "))
        .ok_or_else(|| MonitorError::Transport("no aggregate 'cpu' line in /proc/stat".into()))?;

    let mut snapshot = CounterSnapshot::new();
    for (state, field) in CpuState::ALL.into_iter().zip(line.split_whitespace().skip(1)) {
        let ticks = field
            .parse::<u64>()
            .map_err(|e| MonitorError::Transport(format!("bad '{state}' value '{field}': {e}")))?;
        snapshot = snapshot.with(state, ticks);
    }

    if snapshot.len() < 4 {
        return Err(MonitorError::Transport(format!(
            "expected at least 4 cpu columns, got {}",
            snapshot.len()
        )));
    }
    Ok(snapshot)
}

fn parse_enforce(raw: &str) -> Result<SecurityStatus> {
    match raw.trim() {
        "1" => Ok(SecurityStatus::Enforcing),
        "0" => Ok(SecurityStatus::Permissive),
        other => Err(MonitorError::Transport(format!("unexpected selinux mode '{other}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const PROC_STAT: &str = "\
cpu  10132153 290696 3084719 46828483 16683 0 25195 0 175628 0
cpu0 1393280 32966 572056 13343292 6130 0 17875 0 23933 0
intr 1462898 0 0 0
ctxt 2340289
";

    fn source_with(proc_stat: &Path, selinux: &Path) -> ProcfsSource {
        ProcfsSource::new(&SourceConfig {
            proc_stat:       proc_stat.to_path_buf(),
            selinux_enforce: selinux.to_path_buf(),
        })
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("cpumon-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn parses_aggregate_line() {
        let snapshot = parse_proc_stat(PROC_STAT).unwrap();
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot.get(CpuState::User), Some(10132153));
        assert_eq!(snapshot.get(CpuState::Idle), Some(46828483));
        assert_eq!(snapshot.get(CpuState::Guest), Some(175628));
    }

    #[test]
    fn accepts_short_kernel_lines() {
        let snapshot = parse_proc_stat("cpu  1 2 3 4 5\n").unwrap();
        assert_eq!(snapshot.states(), &CpuState::ALL[..5]);
    }

    #[test]
    fn rejects_too_few_columns() {
        assert!(matches!(
            parse_proc_stat("cpu  1 2 3\n"),
            Err(MonitorError::Transport(_))
        ));
    }

    #[test]
    fn rejects_missing_aggregate_line() {
        assert!(parse_proc_stat("cpu0 1 2 3 4\n").is_err());
    }

    #[test]
    fn rejects_garbage_values() {
        assert!(parse_proc_stat("cpu  1 2 x 4\n").is_err());
    }

    #[tokio::test]
    async fn reads_counters_from_file() {
        let stat = temp_file("stat", PROC_STAT);
        let source = source_with(&stat, Path::new("/nonexistent"));
        let snapshot = source.cpu_counters(&CancellationToken::new()).await.unwrap();
        assert_eq!(snapshot.get(CpuState::System), Some(3084719));
        std::fs::remove_file(stat).ok();
    }

    #[tokio::test]
    async fn cancelled_token_short_circuits() {
        let token = CancellationToken::new();
        token.cancel();
        let source = ProcfsSource::default();
        assert!(matches!(
            source.cpu_counters(&token).await,
            Err(MonitorError::Cancelled)
        ));
    }

    #[tokio::test]
    async fn missing_stat_file_is_transport_error() {
        let source = source_with(Path::new("/nonexistent/stat"), Path::new("/nonexistent"));
        assert!(matches!(
            source.cpu_counters(&CancellationToken::new()).await,
            Err(MonitorError::Transport(_))
        ));
    }

    #[tokio::test]
    async fn host_identity_matches_sysinfo() {
        let identity = ProcfsSource::default().host_identity().await.unwrap();
        assert_eq!(identity.hostname, System::host_name().unwrap_or_default());
        assert_eq!(identity.kernel_version, System::kernel_version().unwrap_or_default());
    }

    #[tokio::test]
    async fn selinux_modes() {
        let enforcing = temp_file("enforce-1", "1\n");
        let permissive = temp_file("enforce-0", "0");
        let stat = Path::new("/proc/stat");

        assert_eq!(
            source_with(stat, &enforcing).security_status().await.unwrap(),
            SecurityStatus::Enforcing
        );
        assert_eq!(
            source_with(stat, &permissive).security_status().await.unwrap(),
            SecurityStatus::Permissive
        );
        assert_eq!(
            source_with(stat, Path::new("/nonexistent/enforce"))
                .security_status()
                .await
                .unwrap(),
            SecurityStatus::Disabled
        );

        std::fs::remove_file(enforcing).ok();
        std::fs::remove_file(permissive).ok();
    }
}
