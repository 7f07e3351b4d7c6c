//! Shared Processor State
//!
//! One record holds everything the processor knows: the pending queue, the
//! running-task table, the terminal sets, the action registry, the sinks and
//! the scheduler handle. Every read and write goes through a single
//! `tokio::sync::Mutex` around this record; lock sections stay short and
//! never call user code (sinks and actions run with the lock released).

use super::registry::ActionRegistry;
use super::types::{TaskData, TaskId};

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Delivery callback for finished tasks. Returning `true` acknowledges the
/// record and the processor forgets it; `false` keeps it in its terminal set
/// for another attempt on the next scheduler tick.
pub type OutcomeSink =
    Arc<dyn Fn(TaskData) -> Pin<Box<dyn Future<Output = bool> + Send>> + Send + Sync>;

/// Wraps a plain async closure into the boxed [`OutcomeSink`] shape.
pub fn outcome_sink<F, Fut>(sink: F) -> OutcomeSink
where
    F: Fn(TaskData) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = bool> + Send + 'static,
{
    Arc::new(move |task| Box::pin(sink(task)))
}

/// Default sink: acknowledges everything so an unconfigured processor
/// discards outcomes instead of accumulating them.
pub(crate) fn noop_sink() -> OutcomeSink {
    outcome_sink(|_task| async { true })
}

/// A dispatched task: its executor handle, its cancellation token, and the
/// dispatch sequence number that pairs the executor with this entry.
pub(crate) struct RunningTask {
    pub seq: u64,
    pub handle: JoinHandle<()>,
    pub cancel: CancellationToken,
}

pub(crate) struct SchedulerHandle {
    pub handle: JoinHandle<()>,
    pub cancel: CancellationToken,
}

pub(crate) struct ProcessorState {
    pub registry: ActionRegistry,
    pub queue: VecDeque<TaskData>,
    pub running: HashMap<TaskId, RunningTask>,
    pub completed: HashMap<TaskId, TaskData>,
    pub errored: HashMap<TaskId, TaskData>,
    pub max_concurrent: usize,
    pub tick_period: Duration,
    pub on_completed: OutcomeSink,
    pub on_error: OutcomeSink,
    pub scheduler: Option<SchedulerHandle>,
    pub next_seq: u64,
}

impl ProcessorState {
    pub fn new() -> Self {
        Self {
            registry: ActionRegistry::new(),
            queue: VecDeque::new(),
            running: HashMap::new(),
            completed: HashMap::new(),
            errored: HashMap::new(),
            max_concurrent: 1,
            tick_period: Duration::from_millis(1),
            on_completed: noop_sink(),
            on_error: noop_sink(),
            scheduler: None,
            next_seq: 0,
        }
    }

    /// A task id counts as known while it is queued, running, or finished
    /// but not yet drained by its sink. Duplicate submissions for known ids
    /// are suppressed.
    pub fn is_known(&self, id: &TaskId) -> bool {
        self.is_live(id) || self.completed.contains_key(id) || self.errored.contains_key(id)
    }

    pub fn is_live(&self, id: &TaskId) -> bool {
        self.running.contains_key(id) || self.queue.iter().any(|task| &task.id == id)
    }

    /// Ids currently queued or running, in no particular order.
    pub fn live_task_ids(&self) -> Vec<TaskId> {
        self.queue
            .iter()
            .map(|task| task.id.clone())
            .chain(self.running.keys().cloned())
            .collect()
    }
}
