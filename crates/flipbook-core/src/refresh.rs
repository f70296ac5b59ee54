// Display refresh sources
//
// A refresh source runs a one-shot callback on the next display refresh.
// Every registration returns a handle so pending callbacks can be
// cancelled when playback stops.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;

use crate::error::RefreshError;

/// Fallback refresh rate when no display-synchronised source exists.
pub const FALLBACK_REFRESH_HZ: u32 = 60;

pub type RefreshCallback = Box<dyn FnOnce() + Send>;

/// Identifies a pending refresh registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshHandle(pub u64);

/// "Schedule next tick" capability.
pub trait RefreshScheduler: Send + Sync {
    /// Runs `callback` once, on the next refresh.
    fn request_refresh(&self, callback: RefreshCallback) -> Result<RefreshHandle, RefreshError>;

    /// Drops a pending registration. Unknown or already-fired handles are ignored.
    fn cancel_refresh(&self, handle: RefreshHandle);
}

/// Locks `mutex`, recovering the data if a callback panicked while holding it.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// ManualRefresh
// ---------------------------------------------------------------------------

/// Refresh source pumped by the host, e.g. from its own vsync or redraw
/// event. Also the deterministic source used in tests.
#[derive(Default)]
pub struct ManualRefresh {
    next_id: AtomicU64,
    pending: Mutex<Vec<(RefreshHandle, RefreshCallback)>>,
}

impl ManualRefresh {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs every callback registered before this call, in registration
    /// order. Callbacks registered while pumping wait for the next pump.
    /// Returns the number of callbacks run.
    pub fn pump(&self) -> usize {
        let batch: Vec<RefreshHandle> = lock(&self.pending).iter().map(|(h, _)| *h).collect();
        let mut ran = 0;
        for handle in batch {
            let callback = {
                let mut pending = lock(&self.pending);
                match pending.iter().position(|(h, _)| *h == handle) {
                    Some(pos) => pending.remove(pos).1,
                    // Cancelled by an earlier callback in this batch.
                    None => continue,
                }
            };
            callback();
            ran += 1;
        }
        ran
    }

    /// Number of callbacks waiting for the next pump.
    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}

impl RefreshScheduler for ManualRefresh {
    fn request_refresh(&self, callback: RefreshCallback) -> Result<RefreshHandle, RefreshError> {
        let handle = RefreshHandle(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.pending).push((handle, callback));
        Ok(handle)
    }

    fn cancel_refresh(&self, handle: RefreshHandle) {
        lock(&self.pending).retain(|(h, _)| *h != handle);
    }
}

// ---------------------------------------------------------------------------
// TimerRefresh
// ---------------------------------------------------------------------------

/// Fixed-interval timer standing in for a display refresh.
///
/// Each registration is a tokio task that sleeps one interval and then runs
/// the callback. Tasks go to the runtime captured at construction, or to
/// the caller's runtime when none was captured. Without either, requests
/// fail with [`RefreshError::NoRuntime`].
pub struct TimerRefresh {
    interval: Duration,
    runtime: Option<Handle>,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<u64, AbortHandle>>>,
}

impl TimerRefresh {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            runtime: Handle::try_current().ok(),
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Timer whose tasks always run on `runtime`, whichever thread registers them.
    pub fn on_runtime(interval: Duration, runtime: Handle) -> Self {
        Self {
            interval,
            runtime: Some(runtime),
            next_id: AtomicU64::new(0),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    fn runtime(&self) -> Result<Handle, RefreshError> {
        match &self.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| RefreshError::NoRuntime),
        }
    }
}

impl Default for TimerRefresh {
    fn default() -> Self {
        Self::new(Duration::from_secs(1) / FALLBACK_REFRESH_HZ)
    }
}

impl RefreshScheduler for TimerRefresh {
    fn request_refresh(&self, callback: RefreshCallback) -> Result<RefreshHandle, RefreshError> {
        let runtime = self.runtime()?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let tasks = Arc::clone(&self.tasks);
        let interval = self.interval;
        // Held until the abort handle is stored so the task cannot remove
        // its entry first.
        let mut pending = lock(&self.tasks);
        let task = runtime.spawn(async move {
            tokio::time::sleep(interval).await;
            lock(&tasks).remove(&id);
            callback();
        });
        pending.insert(id, task.abort_handle());

        Ok(RefreshHandle(id))
    }

    fn cancel_refresh(&self, handle: RefreshHandle) {
        if let Some(task) = lock(&self.tasks).remove(&handle.0) {
            task.abort();
        }
    }
}

impl Drop for TimerRefresh {
    fn drop(&mut self) {
        for (_, task) in lock(&self.tasks).drain() {
            task.abort();
        }
    }
}

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

type RefreshDetector = Box<dyn FnOnce() -> Option<Arc<dyn RefreshScheduler>>>;

/// A named refresh source that may or may not exist on this host.
pub struct RefreshCandidate {
    name: &'static str,
    detect: RefreshDetector,
}

impl RefreshCandidate {
    pub fn new<F>(name: &'static str, detect: F) -> Self
    where
        F: FnOnce() -> Option<Arc<dyn RefreshScheduler>> + 'static,
    {
        Self {
            name,
            detect: Box::new(detect),
        }
    }

    /// A candidate that is always available.
    pub fn available(name: &'static str, scheduler: Arc<dyn RefreshScheduler>) -> Self {
        Self::new(name, move || Some(scheduler))
    }

    /// A [`FALLBACK_REFRESH_HZ`] timer pinned to the tokio runtime that is
    /// current when the candidate is checked. Unavailable outside a runtime.
    pub fn runtime_timer() -> Self {
        Self::new("runtime timer", || {
            let runtime = Handle::try_current().ok()?;
            let timer = TimerRefresh::on_runtime(Duration::from_secs(1) / FALLBACK_REFRESH_HZ, runtime);
            Some(Arc::new(timer) as Arc<dyn RefreshScheduler>)
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Picks the first available candidate, falling back to a
/// [`FALLBACK_REFRESH_HZ`] timer that looks up the caller's runtime on each
/// request. Intended to run once at startup.
pub fn select_refresh<I>(candidates: I) -> Arc<dyn RefreshScheduler>
where
    I: IntoIterator<Item = RefreshCandidate>,
{
    for candidate in candidates {
        if let Some(scheduler) = (candidate.detect)() {
            debug!("using {} refresh source", candidate.name);
            return scheduler;
        }
        debug!("{} refresh source unavailable", candidate.name);
    }
    debug!("falling back to {} Hz timer refresh", FALLBACK_REFRESH_HZ);
    Arc::new(TimerRefresh::default())
}

/// Refresh source used by players that were not given one.
pub fn default_refresh() -> Arc<dyn RefreshScheduler> {
    select_refresh([RefreshCandidate::runtime_timer()])
}
