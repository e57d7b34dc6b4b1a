//! Background sync triggers
//!
//! [`SyncScheduler`] owns two tasks on a tokio runtime: a debounced listener
//! for change notifications and a periodic ticker covering environments
//! where notifications are unreliable. Both ask the target for a
//! non-blocking sync, so a trigger that arrives while a pass is running is
//! dropped rather than queued.

mod watcher;

pub use watcher::{ChangeSource, ManualChangeSource, StateFileWatcher};

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::{Error, Result};
use crate::sync::{SyncEngine, SyncResult, Trigger};

/// Timing of the background triggers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerSettings {
    /// Quiet period after a change notification before syncing
    pub debounce: Duration,
    /// Interval of the fallback timer
    pub poll_interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            poll_interval: Duration::from_secs(10),
        }
    }
}

/// Anything the scheduler can ask to sync.
pub trait SyncTarget: Send + Sync + 'static {
    /// Sync unless a pass is already running; `None` means skipped.
    fn try_sync(&self, trigger: Trigger) -> Option<Result<SyncResult>>;
}

impl SyncTarget for SyncEngine {
    fn try_sync(&self, trigger: Trigger) -> Option<Result<SyncResult>> {
        SyncEngine::try_sync(self, trigger)
    }
}

/// Counters of background runs since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    pub runs: u64,
    pub skipped: u64,
    pub failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    runs: AtomicU64,
    skipped: AtomicU64,
    failures: AtomicU64,
}

/// Owns the watcher and timer lifecycles of one sync target.
///
/// Dropping the scheduler stops it.
pub struct SyncScheduler {
    target: Arc<dyn SyncTarget>,
    source: Box<dyn ChangeSource>,
    settings: SchedulerSettings,
    handle: Handle,
    tasks: Vec<JoinHandle<()>>,
    counters: Arc<Counters>,
}

impl std::fmt::Debug for SyncScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncScheduler")
            .field("settings", &self.settings)
            .field("running", &self.is_running())
            .field("stats", &self.stats())
            .finish()
    }
}

impl SyncScheduler {
    /// Create a stopped scheduler.
    ///
    /// Tasks are spawned on `handle` once [`SyncScheduler::start`] is called.
    pub fn new(
        target: Arc<dyn SyncTarget>,
        source: Box<dyn ChangeSource>,
        settings: SchedulerSettings,
        handle: Handle,
    ) -> Self {
        Self {
            target,
            source,
            settings,
            handle,
            tasks: Vec::new(),
            counters: Arc::new(Counters::default()),
        }
    }

    /// A scheduler watching the engine's central state file.
    pub fn for_engine(engine: Arc<SyncEngine>, settings: SchedulerSettings, handle: Handle) -> Self {
        let source = StateFileWatcher::new(engine.settings().state_file.clone());
        Self::new(engine, Box::new(source), settings, handle)
    }

    /// Start the change listener and the periodic timer.
    ///
    /// Does nothing if already running.
    ///
    /// # Errors
    ///
    /// Returns the change source's error (for the file watcher, a missing
    /// central state file); nothing is left running in that case.
    pub fn start(&mut self) -> Result<()> {
        if self.is_running() {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        self.source.start(tx)?;

        let watch = self.handle.spawn(listen(
            rx,
            Arc::clone(&self.target),
            Arc::clone(&self.counters),
            self.settings.debounce,
        ));
        let poll = self.handle.spawn(poll(
            Arc::clone(&self.target),
            Arc::clone(&self.counters),
            self.settings.poll_interval,
        ));
        self.tasks = vec![watch, poll];

        tracing::info!(
            debounce_ms = self.settings.debounce.as_millis() as u64,
            poll_secs = self.settings.poll_interval.as_secs(),
            "Background sync started"
        );
        Ok(())
    }

    /// Stop both tasks and release the change source.
    ///
    /// A pass already handed to a worker thread finishes on its own.
    pub fn stop(&mut self) {
        if self.tasks.is_empty() {
            return;
        }
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.source.stop();
        tracing::info!("Background sync stopped");
    }

    /// Switch to a new target and source, restarting if currently running.
    pub fn restart_for(&mut self, target: Arc<dyn SyncTarget>, source: Box<dyn ChangeSource>) -> Result<()> {
        let was_running = self.is_running();
        self.stop();
        self.target = target;
        self.source = source;
        if was_running {
            self.start()?;
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        !self.tasks.is_empty()
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    pub fn stats(&self) -> SchedulerStats {
        SchedulerStats {
            runs: self.counters.runs.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
        }
    }
}

impl Drop for SyncScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn listen(
    mut changes: UnboundedReceiver<()>,
    target: Arc<dyn SyncTarget>,
    counters: Arc<Counters>,
    debounce: Duration,
) {
    while changes.recv().await.is_some() {
        tokio::time::sleep(debounce).await;
        while changes.try_recv().is_ok() {}
        dispatch(&target, &counters, Trigger::FileChange).await;
    }
    tracing::debug!("Change notifications closed");
}

async fn poll(target: Arc<dyn SyncTarget>, counters: Arc<Counters>, period: Duration) {
    let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        dispatch(&target, &counters, Trigger::Periodic).await;
    }
}

async fn dispatch(target: &Arc<dyn SyncTarget>, counters: &Counters, trigger: Trigger) {
    let target = Arc::clone(target);
    let outcome = tokio::task::spawn_blocking(move || target.try_sync(trigger)).await;

    match outcome {
        Ok(None) => {
            counters.skipped.fetch_add(1, Ordering::Relaxed);
        }
        Ok(Some(Ok(result))) => {
            counters.runs.fetch_add(1, Ordering::Relaxed);
            if trigger == Trigger::FileChange || !result.is_empty() {
                tracing::info!(%trigger, "Auto-sync completed: {result}");
            }
        }
        Ok(Some(Err(e))) => {
            counters.failures.fetch_add(1, Ordering::Relaxed);
            if is_quiet_failure(trigger, &e) {
                tracing::debug!(%trigger, error = %e, "State file absent, periodic sync skipped");
            } else {
                tracing::error!(%trigger, error = %e, "Auto-sync failed, retrying next cycle");
            }
        }
        Err(e) => {
            counters.failures.fetch_add(1, Ordering::Relaxed);
            tracing::error!(%trigger, error = %e, "Sync worker did not complete");
        }
    }
}

/// The timer keeps ticking while the state file is absent; only change
/// notifications report that as an error.
fn is_quiet_failure(trigger: Trigger, error: &Error) -> bool {
    trigger == Trigger::Periodic && matches!(error, Error::StateFileMissing { .. })
}
