//! Client-side recurrence timers.
//!
//! Every loaded task cycles between [`Activity::Inactive`] and
//! [`Activity::Active`]: it turns active once its first frequency's period
//! has elapsed, stays active for a fixed dwell, then goes back to inactive
//! and waits out the period again. Each task's cycle is its own tokio task
//! with its own [`CancellationToken`]. Nothing here is persisted.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::model::{RecordId, Task};

/// How long a task stays active, in milliseconds, unless configured.
pub const DEFAULT_DWELL_MS: u64 = 1000;

const CHANGE_CAPACITY: usize = 256;

/// Whether a task is currently due.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Activity {
    #[default]
    Inactive,
    Active,
}

/// A task's activity flipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityChange {
    pub task_id: RecordId,
    pub activity: Activity,
}

struct Shared {
    states: Mutex<HashMap<RecordId, Activity>>,
    tx: broadcast::Sender<ActivityChange>,
}

impl Shared {
    fn states(&self) -> MutexGuard<'_, HashMap<RecordId, Activity>> {
        self.states.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record `activity` unless `cancel` has fired. Returns `false` if the
    /// cycle should stop.
    fn set(&self, task_id: &RecordId, activity: Activity, cancel: &CancellationToken) -> bool {
        let mut states = self.states();
        if cancel.is_cancelled() {
            return false;
        }
        let previous = states.insert(task_id.clone(), activity);
        if previous != Some(activity) {
            let _ = self.tx.send(ActivityChange {
                task_id: task_id.clone(),
                activity,
            });
        }
        true
    }

    fn reset(&self, task_id: &RecordId) {
        let mut states = self.states();
        if states.insert(task_id.clone(), Activity::Inactive) == Some(Activity::Active) {
            let _ = self.tx.send(ActivityChange {
                task_id: task_id.clone(),
                activity: Activity::Inactive,
            });
        }
    }
}

struct CycleHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl CycleHandle {
    fn cancel(self) {
        self.cancel.cancel();
        self.join.abort();
    }
}

/// The set of running task cycles.
///
/// Dropping the set cancels every cycle.
pub struct ActivityTimers {
    dwell: Duration,
    shared: Arc<Shared>,
    cycles: Mutex<HashMap<RecordId, CycleHandle>>,
}

impl ActivityTimers {
    /// Timers whose tasks stay active for `dwell` per cycle.
    pub fn new(dwell: Duration) -> Self {
        let (tx, _rx) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            dwell,
            shared: Arc::new(Shared {
                states: Mutex::new(HashMap::new()),
                tx,
            }),
            cycles: Mutex::new(HashMap::new()),
        }
    }

    /// Start (or restart) the cycle for `task` from the inactive state.
    ///
    /// Returns `false` and leaves the task untracked when its first frequency
    /// has no usable period. Must be called inside a tokio runtime.
    pub fn start(&self, task: &Task) -> bool {
        let Some(period) = task.first_period() else {
            warn!(task_id = %task.id, name = %task.name, "task has no usable period; not timing it");
            return false;
        };

        let cancel = CancellationToken::new();
        let mut cycles = self.cycles();
        if let Some(previous) = cycles.remove(&task.id) {
            previous.cancel();
        }
        self.shared.reset(&task.id);

        let join = tokio::spawn(run_cycle(
            task.id.clone(),
            period,
            self.dwell,
            cancel.clone(),
            Arc::clone(&self.shared),
        ));
        cycles.insert(task.id.clone(), CycleHandle { cancel, join });
        debug!(task_id = %task.id, ?period, "started activity cycle");
        true
    }

    /// Start every task, returning how many are now being timed.
    pub fn start_all(&self, tasks: &[Task]) -> usize {
        tasks.iter().filter(|task| self.start(task)).count()
    }

    /// Cancel one task's cycle and mark it inactive. Returns whether it was
    /// running.
    pub fn stop(&self, task_id: &RecordId) -> bool {
        let handle = self.cycles().remove(task_id);
        let running = handle.is_some();
        if let Some(handle) = handle {
            handle.cancel();
            self.shared.reset(task_id);
            debug!(%task_id, "stopped activity cycle");
        }
        running
    }

    /// Cancel every cycle and mark every task inactive.
    pub fn stop_all(&self) {
        let handles: Vec<(RecordId, CycleHandle)> = self.cycles().drain().collect();
        for (task_id, handle) in handles {
            handle.cancel();
            self.shared.reset(&task_id);
        }
    }

    /// Current activity of `task_id`, `None` if it was never started.
    pub fn activity(&self, task_id: &RecordId) -> Option<Activity> {
        self.shared.states().get(task_id).copied()
    }

    pub fn is_active(&self, task_id: &RecordId) -> bool {
        self.activity(task_id) == Some(Activity::Active)
    }

    /// Ids of tasks with a running cycle.
    pub fn running(&self) -> Vec<RecordId> {
        self.cycles().keys().cloned().collect()
    }

    /// Receive every activity change made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<ActivityChange> {
        self.shared.tx.subscribe()
    }

    pub fn dwell(&self) -> Duration {
        self.dwell
    }

    fn cycles(&self) -> MutexGuard<'_, HashMap<RecordId, CycleHandle>> {
        self.cycles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ActivityTimers {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_DWELL_MS))
    }
}

impl Drop for ActivityTimers {
    fn drop(&mut self) {
        for (_, handle) in self.cycles().drain() {
            handle.cancel();
        }
    }
}

async fn run_cycle(
    task_id: RecordId,
    period: Duration,
    dwell: Duration,
    cancel: CancellationToken,
    shared: Arc<Shared>,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(period) => {}
        }
        if !shared.set(&task_id, Activity::Active, &cancel) {
            break;
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(dwell) => {}
        }
        if !shared.set(&task_id, Activity::Inactive, &cancel) {
            break;
        }
    }
}
