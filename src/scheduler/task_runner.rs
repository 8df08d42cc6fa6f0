//! A reusable periodic-task primitive (spec.md §5): a `tokio::time` interval,
//! a busy-guard so a slow tick never overlaps the next one, and cooperative
//! shutdown via a `CancellationToken`. Generalized from the background-task
//! spawn pattern in `application/system.rs` in the teacher codebase, since
//! this system runs several independent cadences (ingestion, alert
//! evaluation, retention, health) rather than the teacher's fixed set.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

pub struct PeriodicTask {
    name: &'static str,
    interval: Duration,
    busy: Arc<AtomicBool>,
    cancellation: CancellationToken,
}

impl PeriodicTask {
    pub fn new(name: &'static str, interval: Duration, cancellation: CancellationToken) -> Self {
        Self {
            name,
            interval,
            busy: Arc::new(AtomicBool::new(false)),
            cancellation,
        }
    }

    /// Runs `tick` on every interval until the cancellation token fires. If a
    /// tick is still running when the next interval elapses, that interval
    /// is skipped (max-instances-per-task = 1).
    pub async fn run<F, Fut>(&self, mut tick: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancellation.cancelled() => {
                    tracing::info!(task = self.name, "shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if self.busy.swap(true, Ordering::AcqRel) {
                        tracing::warn!(task = self.name, "previous tick still running, skipping");
                        continue;
                    }
                    tick().await;
                    self.busy.store(false, Ordering::Release);
                }
            }
        }
    }
}
