use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Fires a callback at a fixed interval on a background Tokio task.
///
/// The first tick fires one full interval after `start`. Late ticks are not
/// bunched up to catch up.
#[derive(Debug, Default)]
pub struct Scheduler {
    run: Option<Run>,
}

#[derive(Debug)]
struct Run {
    stop: CancellationToken,
    task: JoinHandle<()>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking. A no-op while already running.
    pub fn start<F>(&mut self, interval: Duration, mut on_tick: F)
    where
        F: FnMut() + Send + 'static,
    {
        if self.is_running() {
            debug!("scheduler already running");
            return;
        }

        // `time::interval` panics on a zero period.
        let interval = interval.max(Duration::from_millis(1));
        let stop = CancellationToken::new();
        let token = stop.clone();

        let task = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => on_tick(),
                }
            }
        });

        debug!(interval_ms = interval.as_millis() as u64, "scheduler started");
        self.run = Some(Run { stop, task });
    }

    /// Halt future ticks. A no-op when not running.
    pub fn stop(&mut self) {
        if let Some(run) = self.run.take() {
            run.stop.cancel();
            run.task.abort();
            debug!("scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|run| !run.task.is_finished())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting() -> (Arc<AtomicUsize>, impl FnMut() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = count.clone();
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_once_per_interval() {
        let (count, on_tick) = counting();
        let mut scheduler = Scheduler::new();
        scheduler.start(Duration::from_millis(1_000), on_tick);

        time::sleep(Duration::from_millis(500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        time::sleep(Duration::from_millis(3_000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn second_start_is_a_no_op() {
        let (count, on_tick) = counting();
        let (other, other_tick) = counting();
        let mut scheduler = Scheduler::new();
        scheduler.start(Duration::from_millis(1_000), on_tick);
        scheduler.start(Duration::from_millis(1_000), other_tick);

        time::sleep(Duration::from_millis(2_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_halts_ticks() {
        let (count, on_tick) = counting();
        let mut scheduler = Scheduler::new();
        scheduler.start(Duration::from_millis(1_000), on_tick);
        time::sleep(Duration::from_millis(1_500)).await;

        scheduler.stop();
        assert!(!scheduler.is_running());
        time::sleep(Duration::from_millis(5_000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // Stopping twice is harmless.
        scheduler.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn restart_after_stop() {
        let (count, on_tick) = counting();
        let mut scheduler = Scheduler::new();
        scheduler.start(Duration::from_millis(1_000), on_tick);
        scheduler.stop();

        let (again, again_tick) = counting();
        scheduler.start(Duration::from_millis(1_000), again_tick);
        assert!(scheduler.is_running());
        time::sleep(Duration::from_millis(1_500)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(again.load(Ordering::SeqCst), 1);
    }
}
