use chrono::Local;
use cpumon_core::{CounterSnapshot, DashboardState, Diagnostic, MonitorError, Result};
use cpumon_system::{utilization, MetricsSource, UsageWindow};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Mutable state of one sampling session.
///
/// Only the completion continuation of a request touches `previous` and
/// `window`; `pending` holds at most one in-flight request.
#[derive(Debug)]
pub(crate) struct SamplerState {
    previous: Option<CounterSnapshot>,
    pending:  Option<PendingRequest>,
    window:   UsageWindow,
    next_id:  u64,
    retired:  bool,
}

impl SamplerState {
    fn new(window_capacity: usize) -> Self {
        Self {
            previous: None,
            pending:  None,
            window:   UsageWindow::new(window_capacity),
            next_id:  0,
            retired:  false,
        }
    }
}

#[derive(Debug)]
struct PendingRequest {
    id:     u64,
    cancel: CancellationToken,
}

/// What a tick did.
#[derive(Debug)]
pub enum TickOutcome {
    /// A request was issued; the handle resolves once its completion ran.
    Issued(JoinHandle<()>),
    /// A request was already in flight, so this tick was skipped.
    Dropped,
}

/// Keeps at most one counter request outstanding and folds each response
/// into the rolling window.
#[derive(Clone)]
pub struct FetchGuard {
    source:      Arc<dyn MetricsSource>,
    state:       Arc<Mutex<SamplerState>>,
    publish:     Arc<watch::Sender<DashboardState>>,
    diagnostics: broadcast::Sender<Diagnostic>,
}

impl FetchGuard {
    pub fn new(
        source: Arc<dyn MetricsSource>,
        window_capacity: usize,
        publish: Arc<watch::Sender<DashboardState>>,
        diagnostics: broadcast::Sender<Diagnostic>,
    ) -> Self {
        Self {
            source,
            state: Arc::new(Mutex::new(SamplerState::new(window_capacity))),
            publish,
            diagnostics,
        }
    }

    /// Issue a counter request unless one is already pending.
    pub fn tick(&self) -> TickOutcome {
        let (id, cancel) = {
            let mut state = self.lock();
            if state.retired {
                debug!("tick after teardown ignored");
                return TickOutcome::Dropped;
            }
            if let Some(pending) = &state.pending {
                debug!(request = pending.id, "request still pending; dropping tick");
                return TickOutcome::Dropped;
            }
            state.next_id += 1;
            let id = state.next_id;
            let cancel = CancellationToken::new();
            state.pending = Some(PendingRequest { id, cancel: cancel.clone() });
            (id, cancel)
        };

        let guard = self.clone();
        TickOutcome::Issued(tokio::spawn(async move {
            // Racing the token keeps cancellation prompt even for a source
            // that never looks at it.
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(MonitorError::Cancelled),
                res = guard.source.cpu_counters(&cancel) => res,
            };
            guard.complete(id, &cancel, outcome);
        }))
    }

    /// Cancel the in-flight request, if any.
    pub fn cancel(&self) {
        if let Some(pending) = self.lock().pending.take() {
            pending.cancel.cancel();
            debug!(request = pending.id, "cancelled pending request");
        }
    }

    /// Cancel and refuse all further ticks. Used on teardown so a tick racing
    /// the scheduler shutdown cannot leave a request behind.
    pub fn retire(&self) {
        self.lock().retired = true;
        self.cancel();
    }

    pub fn is_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// The baseline the next sample will be measured against.
    pub fn previous(&self) -> Option<CounterSnapshot> {
        self.lock().previous.clone()
    }

    pub fn window(&self) -> Vec<f64> {
        self.lock().window.snapshot()
    }

    fn complete(&self, id: u64, cancel: &CancellationToken, outcome: Result<CounterSnapshot>) {
        let mut state = self.lock();
        if state.pending.as_ref().map(|pending| pending.id) != Some(id) {
            debug!(request = id, "stale completion ignored");
            return;
        }
        state.pending = None;

        if cancel.is_cancelled() {
            debug!(request = id, "request cancelled");
            return;
        }

        let snapshot = match outcome {
            Ok(snapshot) => snapshot,
            Err(MonitorError::Cancelled) => {
                // Our token is still live, so the source gave up on its own.
                warn!(request = id, "source aborted an uncancelled request");
                self.report(Diagnostic::TransportFailed(
                    "source aborted the request without cancellation".into(),
                ));
                return;
            }
            Err(MonitorError::Computation(e)) => {
                warn!(request = id, "malformed counter snapshot: {e}");
                self.report(Diagnostic::ComputationFailed(e.to_string()));
                return;
            }
            Err(e) => {
                warn!(request = id, "counter fetch failed: {e}");
                self.report(Diagnostic::TransportFailed(e.to_string()));
                return;
            }
        };

        let Some(previous) = state.previous.take() else {
            debug!(request = id, "baseline snapshot stored");
            state.previous = Some(snapshot);
            return;
        };

        match utilization(&snapshot, &previous) {
            Ok(sample) => {
                state.window.append(sample);
                let window = state.window.snapshot();
                self.publish.send_modify(|dash| {
                    dash.window = window;
                    dash.updated_at = Some(Local::now());
                });
                debug!(request = id, sample, "cpu sample recorded");
            }
            Err(e) => {
                // Re-baseline below so a counter reset recovers on the next tick.
                warn!(request = id, "cannot compute utilization: {e}");
                self.report(Diagnostic::ComputationFailed(e.to_string()));
            }
        }
        state.previous = Some(snapshot);
    }

    fn report(&self, diagnostic: Diagnostic) {
        // No subscribers is fine.
        let _ = self.diagnostics.send(diagnostic);
    }

    fn lock(&self) -> MutexGuard<'_, SamplerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for FetchGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchGuard").field("state", &self.state).finish_non_exhaustive()
    }
}
