//! Per-Task Executor
//!
//! One executor runs exactly one task. It resolves the action from the
//! registry snapshot it was dispatched with, runs it, and posts the outcome
//! back into the shared state. Executors are independent: a panicking action
//! or a cancellation in one has no effect on any other executor or on the
//! scheduler loop.

use super::registry::ActionRegistry;
use super::state::ProcessorState;
use super::types::{TaskData, TaskState};

use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Every action invocation runs a single partition; partitioned output
/// routing happens controller-side.
const SINGLE_PARTITION: u32 = 1;

/// Spawns the executor for one admitted task.
///
/// `seq` is the dispatch sequence number of the matching `running` entry.
/// The outcome is posted only while that entry is still in place: if the
/// task was stopped (or stopped and resubmitted) in the meantime, the
/// outcome is discarded.
pub(crate) fn spawn_executor(
    state: Arc<Mutex<ProcessorState>>,
    mut task: TaskData,
    registry: ActionRegistry,
    cancel: CancellationToken,
    seq: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        // Let the scheduler publish the running entry before doing anything.
        tokio::task::yield_now().await;

        let outcome = run_task(&mut task, &registry, &cancel).await;

        let mut state = state.lock().await;
        let owned = match state.running.get(&task.id) {
            Some(entry) => entry.seq == seq,
            None => false,
        };
        if !owned {
            tracing::debug!("Task {} was stopped; discarding its outcome", task.id.0);
            return;
        }
        state.running.remove(&task.id);

        match outcome {
            Ok(()) => {
                tracing::debug!("Task {} completed", task.id.0);
                task.state = TaskState::Completed;
                state.completed.insert(task.id.clone(), task);
            }
            Err(e) => {
                tracing::error!("Task {} failed: {:#}", task.id.0, e);
                task.state = TaskState::Errored;
                state.errored.insert(task.id.clone(), task);
            }
        }
    })
}

async fn run_task(
    task: &mut TaskData,
    registry: &ActionRegistry,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let action = match registry.resolve(&task.kind, &task.action)? {
        Some(action) => action,
        None => {
            // Unregistered names pass the task through with its blobs
            // untouched and report success.
            // TODO make pass-through configurable once the controller can
            // distinguish a missing bundle from an intentional no-op action.
            tracing::warn!(
                "No {:?} action named '{}'; passing task {} through unchanged",
                task.kind,
                task.action,
                task.id.0
            );
            return Ok(());
        }
    };

    // The action runs in its own tokio task so that a panic inside user code
    // surfaces as a JoinError instead of unwinding through the executor, and
    // so cancellation can abort it mid-flight.
    let mut work = tokio::spawn(action(SINGLE_PARTITION, task.input.clone()));

    tokio::select! {
        _ = cancel.cancelled() => {
            work.abort();
            Err(anyhow::anyhow!("task cancelled"))
        }
        joined = &mut work => match joined {
            Ok(Ok(output)) => {
                task.output = output;
                Ok(())
            }
            Ok(Err(e)) => Err(e.context("action failed")),
            Err(join_err) if join_err.is_panic() => {
                Err(anyhow::anyhow!("action panicked: {}", join_err))
            }
            Err(join_err) => Err(anyhow::anyhow!("action aborted: {}", join_err)),
        }
    }
}
