use serde::{Deserialize, Serialize};

/// Opaque task identifier. Minted by the controller; the processor never
/// generates ids of its own.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub String);

/// The kind of work a task carries. `Map` tasks resolve against the
/// map-action registry, `Combine` and `Reduce` against the reduce-action
/// registry. `Other` covers kinds this worker does not understand; executing
/// one fails the task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskKind {
    Map,
    Combine,
    Reduce,
    Other(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum TaskState {
    Queued,
    Running,
    Completed,
    Errored,
}

/// Raw payload bytes. The processor hands blobs to actions and stores what
/// they return without ever looking inside.
pub type Blob = Vec<u8>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskData {
    pub id: TaskId,
    pub kind: TaskKind,
    pub action: String,
    pub input: Blob,
    pub output: Blob,
    pub state: TaskState,
}

impl TaskData {
    pub fn new(id: TaskId, kind: TaskKind, action: impl Into<String>, input: Blob) -> Self {
        Self {
            id,
            kind,
            action: action.into(),
            input,
            output: Vec::new(),
            state: TaskState::Queued,
        }
    }
}
