//! Scheduler Loop
//!
//! The single long-lived task that drives the processor. Each tick runs
//! three phases in order:
//!
//! 1. **Admission**: pops queued tasks and spawns executors for them until
//!    the concurrency cap is reached. Greedy within one tick, FIFO order.
//! 2. **Result drain**: takes the completed and errored sets and pushes each
//!    record through its sink. Records the sink does not acknowledge go back
//!    into their terminal set and are retried on a later tick.
//! 3. **Idle**: sleeps for the tick period, or wakes early on shutdown.
//!
//! The loop owns no state of its own; everything lives in `ProcessorState`
//! behind the shared mutex. Nothing that happens inside a tick (a panicking
//! sink, a failing executor) terminates the loop; only its cancellation
//! token does.

use super::executor::spawn_executor;
use super::state::{OutcomeSink, ProcessorState, RunningTask};
use super::types::{TaskData, TaskId, TaskState};

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

pub(crate) async fn run_scheduler(state: Arc<Mutex<ProcessorState>>, cancel: CancellationToken) {
    tracing::info!("Scheduler loop started");

    loop {
        if cancel.is_cancelled() {
            break;
        }

        admit_queued(&state).await;
        drain_finished(&state).await;

        let tick = state.lock().await.tick_period;
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(tick) => {}
        }
    }

    tracing::info!("Scheduler loop stopped");
}

/// Phase 1: move tasks from the queue head into `running` until the cap is
/// hit or the queue is empty.
async fn admit_queued(state: &Arc<Mutex<ProcessorState>>) {
    let mut guard = state.lock().await;

    while guard.running.len() < guard.max_concurrent {
        let Some(mut task) = guard.queue.pop_front() else {
            break;
        };

        task.state = TaskState::Running;
        let id = task.id.clone();
        let registry = guard.registry.snapshot();
        let token = CancellationToken::new();
        let seq = guard.next_seq;
        guard.next_seq += 1;

        let handle = spawn_executor(state.clone(), task, registry, token.clone(), seq);
        guard.running.insert(
            id.clone(),
            RunningTask {
                seq,
                handle,
                cancel: token,
            },
        );

        tracing::debug!(
            "Admitted task {} ({}/{} running)",
            id.0,
            guard.running.len(),
            guard.max_concurrent
        );
    }
}

/// Phase 2: take both terminal sets, deliver each record through its sink
/// with the lock released, and put unacknowledged records back.
async fn drain_finished(state: &Arc<Mutex<ProcessorState>>) {
    let (completed, errored, on_completed, on_error) = {
        let mut guard = state.lock().await;
        if guard.completed.is_empty() && guard.errored.is_empty() {
            return;
        }
        (
            std::mem::take(&mut guard.completed),
            std::mem::take(&mut guard.errored),
            guard.on_completed.clone(),
            guard.on_error.clone(),
        )
    };

    let rejected_completed = deliver_all(completed, &on_completed).await;
    let rejected_errored = deliver_all(errored, &on_error).await;

    if rejected_completed.is_empty() && rejected_errored.is_empty() {
        return;
    }

    let mut guard = state.lock().await;
    // A record the sink deferred goes back for retry unless its id was
    // resubmitted while the drain ran; the fresh task wins in that case.
    for (id, task) in rejected_completed {
        if guard.is_live(&id) {
            tracing::warn!("Task {} resubmitted during drain; dropping stale outcome", id.0);
            continue;
        }
        guard.completed.insert(id, task);
    }
    for (id, task) in rejected_errored {
        if guard.is_live(&id) {
            tracing::warn!("Task {} resubmitted during drain; dropping stale outcome", id.0);
            continue;
        }
        guard.errored.insert(id, task);
    }
}

async fn deliver_all(
    tasks: HashMap<TaskId, TaskData>,
    sink: &OutcomeSink,
) -> HashMap<TaskId, TaskData> {
    let mut rejected = HashMap::new();

    for (id, task) in tasks {
        if !deliver(task.clone(), sink).await {
            rejected.insert(id, task);
        }
    }

    rejected
}

/// Runs the sink inside its own task so a panicking sink cannot take the
/// scheduler loop down with it. A panic counts as "not delivered".
async fn deliver(task: TaskData, sink: &OutcomeSink) -> bool {
    let id = task.id.clone();
    let fut = sink(task);

    match tokio::spawn(fut).await {
        Ok(true) => true,
        Ok(false) => {
            tracing::debug!("Sink deferred task {}; retrying next tick", id.0);
            false
        }
        Err(e) => {
            tracing::error!("Sink panicked on task {}: {}", id.0, e);
            false
        }
    }
}
