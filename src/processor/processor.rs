//! Processor API
//!
//! [`TaskProcessor`] is the in-process surface the rest of the worker talks
//! to: the controller-facing transport calls `submit_task`/`stop_task` on
//! it, the node bootstrap installs action bundles and sinks, and the
//! lifecycle hooks start and stop the scheduler loop. There is no hidden
//! singleton; a processor is an explicitly constructed value that owns its
//! state behind one mutex.

use super::registry::ActionFn;
use super::scheduler::run_scheduler;
use super::state::{outcome_sink, OutcomeSink, ProcessorState, SchedulerHandle};
use super::types::{TaskData, TaskId, TaskState};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub struct TaskProcessor {
    pub(crate) state: Arc<Mutex<ProcessorState>>,
}

impl TaskProcessor {
    /// Fresh processor: concurrency cap of 1, 1 ms tick, empty collections,
    /// acknowledge-everything sinks, scheduler inactive.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ProcessorState::new())),
        }
    }

    // --- Registry ---

    /// Replaces the map-action half of the registry. Tasks already
    /// dispatched keep the actions they were dispatched with.
    pub async fn set_map_actions(&self, actions: HashMap<String, ActionFn>) {
        self.state.lock().await.registry.set_map_actions(actions);
    }

    /// Replaces the reduce-action half of the registry. Combine tasks
    /// resolve against this half too.
    pub async fn set_reduce_actions(&self, actions: HashMap<String, ActionFn>) {
        self.state.lock().await.registry.set_reduce_actions(actions);
    }

    pub async fn list_map_actions(&self) -> Vec<String> {
        self.state.lock().await.registry.map_action_names()
    }

    pub async fn list_reduce_actions(&self) -> Vec<String> {
        self.state.lock().await.registry.reduce_action_names()
    }

    // --- Sinks ---

    /// Replaces the completion sink. Safe to call while the scheduler is
    /// running; the next drain picks the new sink up.
    pub async fn set_completed_sink<F, Fut>(&self, sink: F)
    where
        F: Fn(TaskData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.set_completed_sink_fn(outcome_sink(sink)).await;
    }

    /// Replaces the error sink. Safe to call while the scheduler is running.
    pub async fn set_error_sink<F, Fut>(&self, sink: F)
    where
        F: Fn(TaskData) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.set_error_sink_fn(outcome_sink(sink)).await;
    }

    pub async fn set_completed_sink_fn(&self, sink: OutcomeSink) {
        self.state.lock().await.on_completed = sink;
    }

    pub async fn set_error_sink_fn(&self, sink: OutcomeSink) {
        self.state.lock().await.on_error = sink;
    }

    // --- Configuration ---

    /// Sets the concurrency cap. Values below 1 are clamped; the new cap
    /// applies from the next scheduler tick.
    pub async fn set_max_concurrent(&self, max_concurrent: usize) {
        if max_concurrent == 0 {
            tracing::warn!("Concurrency cap must be at least 1; clamping");
        }
        self.state.lock().await.max_concurrent = max_concurrent.max(1);
    }

    pub async fn set_tick_period(&self, tick_period: Duration) {
        self.state.lock().await.tick_period = tick_period;
    }

    // --- Lifecycle ---

    /// Starts the scheduler loop. Idempotent: calling on a running
    /// processor does nothing.
    pub async fn start(&self) {
        let mut guard = self.state.lock().await;
        if guard.scheduler.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_scheduler(self.state.clone(), cancel.clone()));
        guard.scheduler = Some(SchedulerHandle { handle, cancel });

        tracing::info!("Task processor started");
    }

    /// Stops the scheduler loop and waits for it to wind down. Idempotent.
    ///
    /// Running tasks are not cancelled: their executors keep going and post
    /// their outcomes into the now-static state, where they stay readable
    /// until the processor is started again.
    pub async fn stop(&self) {
        let scheduler = self.state.lock().await.scheduler.take();
        let Some(scheduler) = scheduler else {
            return;
        };

        scheduler.cancel.cancel();
        if let Err(e) = scheduler.handle.await {
            tracing::error!("Scheduler loop ended abnormally: {}", e);
        }

        tracing::info!("Task processor stopped");
    }

    pub async fn close(&self) {
        self.stop().await;
    }

    // --- Task submission and cancellation ---

    /// Appends a task to the queue tail. Submissions whose id is already
    /// queued, running, or finished-but-undrained are ignored.
    pub async fn submit_task(&self, mut task: TaskData) {
        let mut guard = self.state.lock().await;

        if guard.is_known(&task.id) {
            tracing::debug!("Duplicate submission for task {}; ignored", task.id.0);
            return;
        }

        task.state = TaskState::Queued;
        tracing::debug!("Queued task {} ({} pending)", task.id.0, guard.queue.len() + 1);
        guard.queue.push_back(task);
    }

    /// Removes a task wherever it lives among the live collections and, if
    /// it was running, signals its executor to cancel. The cancellation is
    /// best-effort and asynchronous; whatever the executor produces
    /// afterwards is discarded. Terminal sets are untouched.
    pub async fn stop_task(&self, id: &TaskId) {
        let removed = {
            let mut guard = self.state.lock().await;
            guard.queue.retain(|task| &task.id != id);
            guard.running.remove(id)
        };

        // Signalled outside the lock; the executor observes the token at its
        // own suspension points. Best-effort: an executor that already
        // finished has nothing left to observe.
        if let Some(entry) = removed {
            entry.cancel.cancel();
            if entry.handle.is_finished() {
                tracing::debug!("Task {} finished before the cancel signal", id.0);
            } else {
                tracing::debug!("Cancelled running task {}", id.0);
            }
        }
    }

    /// Stops every task currently queued or running. Tasks submitted while
    /// this runs may or may not be caught.
    pub async fn stop_all_tasks(&self) {
        let ids = self.state.lock().await.live_task_ids();
        tracing::info!("Stopping {} task(s)", ids.len());
        for id in ids {
            self.stop_task(&id).await;
        }
    }

    /// Snapshot of queued and running task ids, in no particular order.
    pub async fn list_task_ids(&self) -> Vec<TaskId> {
        self.state.lock().await.live_task_ids()
    }

    // --- Diagnostics ---

    /// One-line human-readable rendering of the processor. The format is
    /// for logs and debugging only.
    pub async fn describe(&self) -> String {
        let guard = self.state.lock().await;
        format!(
            "TaskProcessor {{ scheduler: {}, queued: {}, running: {}/{}, completed: {}, errored: {}, map_actions: {}, reduce_actions: {}, tick: {:?} }}",
            if guard.scheduler.is_some() { "active" } else { "inactive" },
            guard.queue.len(),
            guard.running.len(),
            guard.max_concurrent,
            guard.completed.len(),
            guard.errored.len(),
            guard.registry.map_action_names().len(),
            guard.registry.reduce_action_names().len(),
            guard.tick_period,
        )
    }
}

impl Default for TaskProcessor {
    fn default() -> Self {
        Self::new()
    }
}
