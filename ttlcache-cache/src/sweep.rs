//! Background sweep task.
//!
//! One task per cache. It ticks at a fixed interval and asks its target to
//! drop expired entries until the cancellation token fires or the target is
//! gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Storage that can be swept.
pub(crate) trait Sweep: Send + Sync + 'static {
    /// Removes expired entries and returns how many were removed.
    fn sweep(&self) -> usize;
}

/// Clears the running flag however the task ends, including runtime shutdown.
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Spawns the sweep loop on `handle`.
///
/// `running` is set before the task is spawned and cleared when it exits.
pub(crate) fn spawn<S: Sweep>(
    handle: &Handle,
    target: Weak<S>,
    interval: Duration,
    cancel: CancellationToken,
    running: Arc<AtomicBool>,
) -> JoinHandle<()> {
    running.store(true, Ordering::SeqCst);
    let guard = RunningGuard(running);
    handle.spawn(async move {
        let _guard = guard;
        run(target, interval, cancel).await;
    })
}

async fn run<S: Sweep>(target: Weak<S>, interval: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; the first sweep waits one interval.
    ticker.tick().await;

    info!(interval_ms = interval.as_millis() as u64, "Sweeper started");

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("Sweeper cancelled");
                break;
            }
            _ = ticker.tick() => {
                let Some(target) = target.upgrade() else {
                    debug!("Cache dropped, sweeper exiting");
                    break;
                };
                let removed = target.sweep();
                if removed > 0 {
                    debug!(removed, "Swept expired entries");
                }
            }
        }
    }
}
