//! Periodic background tasks.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::debug;

/// Shortest period a [`PeriodicTask`] runs at; shorter intervals are raised to it.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

// About 30 years, the same horizon tokio uses for "never".
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// When the first run of a [`PeriodicTask`] happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirstRun {
    /// Run at once, then every interval.
    Immediately,
    /// Wait one interval before the first run.
    AfterInterval,
}

/// A job re-run on a fixed interval until stopped.
///
/// Runs of one task never overlap: a run that outlasts the interval pushes the next
/// tick back. Dropping the handle stops the task.
#[derive(Debug)]
pub struct PeriodicTask {
    name: &'static str,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn `job` on the current tokio runtime.
    ///
    /// An `interval` below [`MIN_INTERVAL`] is raised to it.
    ///
    /// # Panics
    /// Panics if called outside a tokio runtime.
    pub fn start<F, Fut>(name: &'static str, interval: Duration, first_run: FirstRun, mut job: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let interval = interval.max(MIN_INTERVAL);
        let now = Instant::now();
        let start = match first_run {
            FirstRun::Immediately => now,
            FirstRun::AfterInterval => now
                .checked_add(interval)
                .unwrap_or_else(|| now + FAR_FUTURE),
        };
        let mut ticker = time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let handle = tokio::spawn(async move {
            loop {
                ticker.tick().await;
                debug!(task = name, "periodic task tick");
                job().await;
            }
        });

        Self { name, handle }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    /// Cancel the task. A run in progress is dropped at its next await point.
    pub fn stop(self) {
        debug!(task = self.name, "periodic task stopped");
        // Drop aborts.
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
