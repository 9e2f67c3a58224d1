use crate::guard::FetchGuard;
use crate::scheduler::Scheduler;
use cpumon_config::SamplerConfig;
use cpumon_core::{DashboardState, Diagnostic};
use cpumon_system::MetricsSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Capacity of the diagnostics broadcast; slow subscribers lose the oldest.
const DIAGNOSTIC_BACKLOG: usize = 32;

/// Owns one dashboard's sampling session and its static panels.
///
/// The hosting view calls [`activate`](Self::activate) when it becomes
/// visible and [`deactivate`](Self::deactivate) when hidden. Both are
/// idempotent.
pub struct Lifecycle {
    source:       Arc<dyn MetricsSource>,
    config:       SamplerConfig,
    state:        Arc<watch::Sender<DashboardState>>,
    diagnostics:  broadcast::Sender<Diagnostic>,
    scheduler:    Scheduler,
    guard:        Option<FetchGuard>,
    static_fetch: Option<JoinHandle<()>>,
}

impl Lifecycle {
    pub fn new(source: Arc<dyn MetricsSource>, config: SamplerConfig) -> Self {
        let (state, _) = watch::channel(DashboardState::default());
        let (diagnostics, _) = broadcast::channel(DIAGNOSTIC_BACKLOG);
        Self {
            source,
            config,
            state: Arc::new(state),
            diagnostics,
            scheduler: Scheduler::new(),
            guard: None,
            static_fetch: None,
        }
    }

    /// Fetch the static panels and start sampling with an empty window.
    pub fn activate(&mut self) {
        if self.is_active() {
            debug!("dashboard already active");
            return;
        }

        let guard = FetchGuard::new(
            self.source.clone(),
            self.config.window_capacity,
            self.state.clone(),
            self.diagnostics.clone(),
        );
        self.state.send_modify(|dash| {
            dash.window.clear();
            dash.updated_at = None;
        });

        self.static_fetch = Some(tokio::spawn(fetch_static(
            self.source.clone(),
            self.state.clone(),
        )));

        let ticker = guard.clone();
        self.scheduler
            .start(Duration::from_millis(self.config.interval_ms), move || {
                ticker.tick();
            });
        self.guard = Some(guard);

        info!(
            interval_ms = self.config.interval_ms,
            window = self.config.window_capacity,
            "dashboard activated"
        );
    }

    /// Cancel any in-flight request and stop ticking. The last window stays
    /// published until the next activation.
    pub fn deactivate(&mut self) {
        if let Some(guard) = &self.guard {
            guard.retire();
        }
        let was_active = self.is_active();
        self.scheduler.stop();
        if let Some(task) = self.static_fetch.take() {
            task.abort();
        }
        if was_active {
            info!("dashboard deactivated");
        }
    }

    pub fn is_active(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Subscribe to the rendered state.
    pub fn state(&self) -> watch::Receiver<DashboardState> {
        self.state.subscribe()
    }

    /// Subscribe to transport and computation failure notices.
    pub fn diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.diagnostics.subscribe()
    }

    /// Fetch guard of the current (or most recent) session.
    pub fn guard(&self) -> Option<&FetchGuard> {
        self.guard.as_ref()
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        self.deactivate();
    }
}

async fn fetch_static(source: Arc<dyn MetricsSource>, state: Arc<watch::Sender<DashboardState>>) {
    let (identity, security, processors) = tokio::join!(
        source.host_identity(),
        source.security_status(),
        source.processor_inventory(),
    );

    match identity {
        Ok(identity) => state.send_modify(|dash| dash.identity = Some(identity)),
        Err(e) => warn!("host identity fetch failed: {e}"),
    }
    match security {
        Ok(security) => state.send_modify(|dash| dash.security = Some(security)),
        Err(e) => warn!("security status fetch failed: {e}"),
    }
    match processors {
        Ok(processors) => {
            debug!(count = processors.len(), "processor inventory loaded");
            state.send_modify(|dash| dash.processors = Some(processors));
        }
        Err(e) => warn!("processor inventory fetch failed: {e}"),
    }
}
