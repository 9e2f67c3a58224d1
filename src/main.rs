//! cpumon — live CPU utilization sampler for the local host.
//!
//! Run with:  `RUST_LOG=info cpumon [path/to/cpumon.toml]`

use anyhow::Result;
use cpumon_sampler::Lifecycle;
use cpumon_system::ProcfsSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Structured logging — RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!("cpumon v{} starting", env!("CARGO_PKG_VERSION"));

    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(cpumon_config::default_path);
    let config = cpumon_config::load(&path)?;

    let source = Arc::new(ProcfsSource::new(&config.source));
    let mut dashboard = Lifecycle::new(source, config.sampler);
    let mut state = dashboard.state();
    let mut diagnostics = dashboard.diagnostics();
    dashboard.activate();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let dash = state.borrow_and_update().clone();
                if let Some(identity) = &dash.identity {
                    tracing::debug!(host = %identity.hostname, security = ?dash.security, "host panel");
                }
                if let Some(latest) = dash.latest() {
                    tracing::info!(window = ?dash.window, "cpu {latest:.2}%");
                }
            }
            Ok(diagnostic) = diagnostics.recv() => {
                tracing::warn!(?diagnostic, "sample failed");
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }

    dashboard.deactivate();
    Ok(())
}
